mod app_error;
mod field_errors;

pub use app_error::AppError;
pub use field_errors::{FieldError, FieldErrors};
