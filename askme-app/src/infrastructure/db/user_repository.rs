use super::entities::{profile, user, Profile, User};
use crate::domain::Author;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use std::collections::HashMap;
use uuid::Uuid;

/// Account data accepted by [`UserRepository::create_with_profile`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub avatar: Option<String>,
}

#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, DbErr> {
        User::find_by_id(id).one(&self.db).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, DbErr> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    /// Whether `email` belongs to an account other than `except`.
    pub async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query.one(&self.db).await?.is_some())
    }

    /// Inserts the user and its profile in one transaction.
    pub async fn create_with_profile(&self, new_user: NewUser) -> Result<user::Model, DbErr> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now();

        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        profile::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            nickname: Set(new_user.nickname),
            avatar: Set(new_user.avatar),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(user)
    }

    pub async fn profile_for_user(&self, user_id: Uuid) -> Result<Option<profile::Model>, DbErr> {
        Profile::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    pub async fn profile_with_user(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<(profile::Model, user::Model)>, DbErr> {
        let row = Profile::find_by_id(profile_id)
            .find_also_related(User)
            .one(&self.db)
            .await?;
        Ok(row.and_then(|(p, u)| u.map(|u| (p, u))))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        email: String,
        nickname: String,
        avatar: Option<String>,
    ) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;

        let user = User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(DbErr::RecordNotFound("User".to_string()))?;
        let mut active: user::ActiveModel = user.into();
        active.email = Set(email);
        active.update(&txn).await?;

        let profile = Profile::find()
            .filter(profile::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or(DbErr::RecordNotFound("Profile".to_string()))?;
        let mut active: profile::ActiveModel = profile.into();
        active.nickname = Set(nickname);
        active.avatar = Set(avatar);
        active.update(&txn).await?;

        txn.commit().await
    }

    /// Author cards for a batch of users, one query for all of them.
    pub async fn authors(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, Author>, DbErr> {
        authors(&self.db, user_ids).await
    }
}

pub(crate) async fn authors<C>(conn: &C, user_ids: &[Uuid]) -> Result<HashMap<Uuid, Author>, DbErr>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = User::find()
        .filter(user::Column::Id.is_in(user_ids.iter().copied()))
        .find_also_related(Profile)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(u, p)| (u.id, to_author(u, p)))
        .collect())
}

pub(crate) fn to_author(user: user::Model, profile: Option<profile::Model>) -> Author {
    let (profile_id, nickname, avatar) = match profile {
        Some(p) => (Some(p.id), p.nickname, p.avatar),
        None => (None, String::new(), None),
    };
    Author {
        user_id: user.id,
        profile_id,
        username: user.username,
        nickname,
        avatar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::testing;

    #[tokio::test]
    async fn test_create_with_profile_and_batch_authors() {
        let db = testing::memory_db().await;
        let repo = UserRepository::new(db.clone());

        let alice = testing::seed_user(&db, "alice").await;
        let bob = testing::seed_user(&db, "bob").await;

        let authors = repo.authors(&[alice.id, bob.id]).await.unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[&alice.id].username, "alice");
        assert_eq!(authors[&alice.id].nickname, "alice nick");
        assert!(authors[&bob.id].profile_id.is_some());
    }

    #[tokio::test]
    async fn test_email_taken_ignores_own_account() {
        let db = testing::memory_db().await;
        let repo = UserRepository::new(db.clone());
        let alice = testing::seed_user(&db, "alice").await;

        assert!(repo.email_taken(&alice.email, None).await.unwrap());
        assert!(!repo.email_taken(&alice.email, Some(alice.id)).await.unwrap());
        assert!(!repo.email_taken("nobody@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected_by_database() {
        let db = testing::memory_db().await;
        let repo = UserRepository::new(db.clone());
        testing::seed_user(&db, "alice").await;

        let err = repo
            .create_with_profile(NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "x".to_string(),
                nickname: "again".to_string(),
                avatar: None,
            })
            .await
            .unwrap_err();
        let err: askme_errors::AppError = err.into();
        assert!(matches!(err, askme_errors::AppError::Conflict(_)));
    }
}
