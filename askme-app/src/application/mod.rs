mod accounts;
mod answers;
mod audit;
mod feed;
pub mod forms;
mod questions;
mod votes;

pub use accounts::{Accounts, CurrentUser};
pub use answers::AnswerService;
pub use audit::{AuditReport, CounterAudit, CounterCheck, QuestionAudit};
pub use feed::{Feed, QuestionPage, Sidebar, SIDEBAR_LIMIT};
pub use questions::QuestionService;
pub use votes::VoteService;
