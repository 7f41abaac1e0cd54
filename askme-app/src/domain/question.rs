use super::{Author, VoteKind};
use serde::{Deserialize, Serialize};

/// Question with everything a listing needs (author, tag names, viewer's vote)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionWithDetails {
    pub id: uuid::Uuid,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub tags: Vec<String>,
    pub rating: i32,
    pub answers_count: i32,
    pub viewer_vote: Option<VoteKind>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerWithDetails {
    pub id: uuid::Uuid,
    pub question_id: uuid::Uuid,
    pub content: String,
    pub author: Author,
    pub is_correct: bool,
    pub rating: i32,
    pub viewer_vote: Option<VoteKind>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Entry of the "popular tags" side panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub questions_count: i64,
}

/// Result of posting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedAnswer {
    pub answer_id: uuid::Uuid,
    pub question_id: uuid::Uuid,
    pub answers_count: i32,
}
