mod page;
mod question;
mod user;
mod vote;

pub use page::{num_pages, Page, PageInfo, PageRequest, DEFAULT_PAGE_SIZE};
pub use question::{AnswerWithDetails, PostedAnswer, QuestionWithDetails, TagCount};
pub use user::{Actor, Author, Contributor, ProfileDetails};
pub use vote::{UnknownVoteKind, VoteKind, VoteResult, VoteTarget};
