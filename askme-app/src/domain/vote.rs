use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single user's opinion on a question or an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Contribution of this vote to the cached rating.
    pub fn delta(&self) -> i32 {
        match self {
            Self::Like => 1,
            Self::Dislike => -1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVoteKind(pub String);

impl fmt::Display for UnknownVoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid like type: {}", self.0)
    }
}

impl std::error::Error for UnknownVoteKind {}

impl FromStr for VoteKind {
    type Err = UnknownVoteKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(UnknownVoteKind(other.to_string())),
        }
    }
}

/// What a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteTarget {
    Question(uuid::Uuid),
    Answer(uuid::Uuid),
}

impl VoteTarget {
    pub fn id(&self) -> uuid::Uuid {
        match self {
            Self::Question(id) | Self::Answer(id) => *id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Question(_) => "Question",
            Self::Answer(_) => "Answer",
        }
    }
}

/// State after a vote mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResult {
    pub vote: Option<VoteKind>,
    pub rating: i32,
}
