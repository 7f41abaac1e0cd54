mod input_sanitizer;
mod password;

pub use input_sanitizer::InputSanitizer;
pub use password::Passwords;
