//! In-memory SQLite fixtures shared by the unit tests.

use super::entities::{question, user};
use super::{run_migrations, NewUser, UserRepository};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

/// A fresh database with the production schema. A single pooled connection
/// keeps the in-memory database alive for the whole test.
pub async fn memory_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

/// Fixed instant `minutes` after a base time, for deterministic ordering.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 13, 12, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

pub async fn seed_user(db: &DatabaseConnection, username: &str) -> user::Model {
    UserRepository::new(db.clone())
        .create_with_profile(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            nickname: format!("{username} nick"),
            avatar: None,
        })
        .await
        .unwrap()
}

pub async fn seed_question(
    db: &DatabaseConnection,
    author_id: Uuid,
    title: &str,
    minutes: i64,
) -> question::Model {
    question::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        content: Set(format!("{title} body")),
        author_id: Set(author_id),
        rating: Set(0),
        answers_count: Set(0),
        created_at: Set(at(minutes)),
    }
    .insert(db)
    .await
    .unwrap()
}
