pub mod answer;
pub mod answer_like;
pub mod profile;
pub mod question;
pub mod question_like;
pub mod question_tag;
pub mod tag;
pub mod user;

pub use answer::Entity as Answer;
pub use answer_like::Entity as AnswerLike;
pub use profile::Entity as Profile;
pub use question::Entity as Question;
pub use question_like::Entity as QuestionLike;
pub use question_tag::Entity as QuestionTag;
pub use tag::Entity as Tag;
pub use user::Entity as User;
