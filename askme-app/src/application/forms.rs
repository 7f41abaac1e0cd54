//! Raw form/JSON inputs and the cleaning rules applied before anything
//! touches the database.

use crate::domain::VoteKind;
use crate::infrastructure::security::InputSanitizer;
use askme_errors::{AppError, FieldErrors};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

pub const TITLE_MAX: usize = 255;
pub const TEXT_MAX: usize = 2048;
pub const TAG_MAX: usize = 255;
pub const NICKNAME_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 8;

const REQUIRED: &str = "This field is required.";

fn username_re() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex_lite::Regex::new(r"^[a-z0-9_.@+-]{3,150}$").expect("username pattern is valid")
    })
}

fn email_re() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex_lite::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

fn too_long(max: usize) -> String {
    format!("Ensure this value has at most {} characters.", max)
}

fn required_text(errors: &mut FieldErrors, field: &str, raw: &str, max: usize) -> String {
    let value = InputSanitizer::clean_text(raw);
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if value.chars().count() > max {
        errors.add(field, too_long(max));
    }
    value
}

fn clean_email(errors: &mut FieldErrors, raw: &str) -> String {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if !email_re().is_match(&email) {
        errors.add("email", "Enter a valid email address.");
    }
    email
}

fn optional(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn clean(&self) -> Result<Credentials, AppError> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim().to_lowercase();
        let password = self.password.trim().to_string();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.finish(Credentials { username, password })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub repeat_password: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub avatar: Option<String>,
}

impl SignupForm {
    pub fn clean(&self) -> Result<NewAccount, AppError> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim().to_lowercase();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if !username_re().is_match(&username) {
            errors.add(
                "username",
                "Use 3 to 150 letters, digits and @/./+/-/_ characters.",
            );
        }

        let email = clean_email(&mut errors, &self.email);
        let nickname = required_text(&mut errors, "nickname", &self.nickname, NICKNAME_MAX);

        let password = self.password.trim().to_string();
        let repeat = self.repeat_password.trim().to_string();
        if password.is_empty() {
            errors.add("password", REQUIRED);
        } else if password.chars().count() < PASSWORD_MIN {
            errors.add(
                "password",
                format!("Password must be at least {} characters.", PASSWORD_MIN),
            );
        }
        if repeat.is_empty() {
            errors.add("repeat_password", REQUIRED);
        } else if password != repeat {
            errors.add_non_field("Passwords do not match");
        }

        errors.finish(NewAccount {
            username,
            email,
            nickname,
            password,
            avatar: optional(&self.avatar),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl AskForm {
    pub fn clean(&self) -> Result<NewQuestion, AppError> {
        let mut errors = FieldErrors::new();
        let title = required_text(&mut errors, "title", &self.title, TITLE_MAX);
        let content = required_text(&mut errors, "text", &self.text, TEXT_MAX);

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.split_whitespace() {
            if tag.chars().count() > TAG_MAX {
                errors.add("tags", too_long(TAG_MAX));
                break;
            }
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        errors.finish(NewQuestion {
            title,
            content,
            tags,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerForm {
    #[serde(default)]
    pub text: String,
}

impl AnswerForm {
    pub fn clean(&self) -> Result<String, AppError> {
        let mut errors = FieldErrors::new();
        let text = required_text(&mut errors, "text", &self.text, TEXT_MAX);
        errors.finish(text)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileEditForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub email: String,
    pub nickname: String,
    pub avatar: Option<String>,
}

impl ProfileEditForm {
    pub fn clean(&self) -> Result<ProfileChanges, AppError> {
        let mut errors = FieldErrors::new();
        let email = clean_email(&mut errors, &self.email);
        let nickname = required_text(&mut errors, "nickname", &self.nickname, NICKNAME_MAX);
        errors.finish(ProfileChanges {
            email,
            nickname,
            avatar: optional(&self.avatar),
        })
    }
}

/// Parses the `type` field of a vote payload.
pub fn parse_vote_kind(raw: Option<&str>) -> Result<VoteKind, AppError> {
    raw.unwrap_or_default()
        .parse::<VoteKind>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Parses a target id from a JSON payload; an id that cannot name a row is
/// reported the same way as a row that does not exist.
pub fn parse_target_id(raw: Option<&str>, what: &str) -> Result<Uuid, AppError> {
    raw.and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| AppError::not_found(what))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeQuestionPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "questionId")]
    pub question_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeAnswerPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "answerId")]
    pub answer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAnswerPayload {
    #[serde(alias = "answerId")]
    pub answer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovePayload {
    #[serde(alias = "answerId")]
    pub answer_id: Option<String>,
    #[serde(alias = "questionId")]
    pub question_id: Option<String>,
}
