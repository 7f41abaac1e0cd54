use serde::{Deserialize, Serialize};

/// The authenticated user on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: uuid::Uuid,
}

impl Actor {
    pub fn new(user_id: uuid::Uuid) -> Self {
        Self { user_id }
    }
}

/// Public identity of a question/answer author, joined with their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub user_id: uuid::Uuid,
    pub profile_id: Option<uuid::Uuid>,
    pub username: String,
    pub nickname: String,
    pub avatar: Option<String>,
}

impl Author {
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.username
        } else {
            &self.nickname
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub profile_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub questions_count: u64,
    pub answers_count: u64,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// Entry of the "best members" side panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub author: Author,
    pub rating: i64,
}
