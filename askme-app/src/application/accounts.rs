use super::forms::{Credentials, NewAccount, ProfileChanges};
use crate::domain::Actor;
use crate::infrastructure::db::entities::{profile, user};
use crate::infrastructure::db::{NewUser, UserRepository};
use crate::infrastructure::security::Passwords;
use askme_errors::{AppError, FieldErrors};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

const INVALID_LOGIN: &str = "Invalid username or password";

/// The signed-in user together with their profile, as shown in page headers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: user::Model,
    pub profile: profile::Model,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user.id)
    }
}

#[derive(Clone)]
pub struct Accounts {
    users: UserRepository,
}

impl Accounts {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: UserRepository::new(db),
        }
    }

    pub async fn signup(&self, account: NewAccount) -> Result<Actor, AppError> {
        let mut errors = FieldErrors::new();
        if self.users.username_taken(&account.username).await? {
            errors.add("username", "A user with that username already exists.");
        }
        if self.users.email_taken(&account.email, None).await? {
            errors.add("email", "A user with that email already exists.");
        }
        errors.finish(())?;

        let password_hash = Passwords::hash_blocking(account.password).await?;
        let user = self
            .users
            .create_with_profile(NewUser {
                username: account.username,
                email: account.email,
                password_hash,
                nickname: account.nickname,
                avatar: account.avatar,
            })
            .await
            .map_err(|e| match AppError::from(e) {
                // lost a race with a concurrent signup for the same name
                AppError::Conflict(_) => AppError::Validation(FieldErrors::non_field(
                    "A user with that username or email already exists.",
                )),
                other => other,
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
        Ok(Actor::new(user.id))
    }

    /// Checks the credentials. Unknown user and wrong password fail the same way.
    pub async fn login(&self, credentials: Credentials) -> Result<Actor, AppError> {
        let Some(user) = self.users.find_by_username(&credentials.username).await? else {
            tracing::debug!(username = %credentials.username, "Login for unknown user");
            return Err(AppError::Validation(FieldErrors::non_field(INVALID_LOGIN)));
        };

        if !Passwords::verify_blocking(credentials.password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::Validation(FieldErrors::non_field(INVALID_LOGIN)));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(Actor::new(user.id))
    }

    /// Resolves the session's user id. A stale id (deleted account) is `None`.
    pub async fn current(&self, user_id: Uuid) -> Result<Option<CurrentUser>, AppError> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };
        let Some(profile) = self.users.profile_for_user(user_id).await? else {
            return Ok(None);
        };
        Ok(Some(CurrentUser { user, profile }))
    }

    pub async fn edit_profile(&self, actor: Actor, changes: ProfileChanges) -> Result<(), AppError> {
        if self
            .users
            .email_taken(&changes.email, Some(actor.user_id))
            .await?
        {
            return Err(AppError::Validation(FieldErrors::single(
                "email",
                "A user with that email already exists.",
            )));
        }

        self.users
            .update_profile(actor.user_id, changes.email, changes.nickname, changes.avatar)
            .await?;
        tracing::info!(user_id = %actor.user_id, "Profile updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::testing;

    fn account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.into(),
            email: email.into(),
            nickname: format!("{username} the great"),
            password: "password123".into(),
            avatar: None,
        }
    }

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let db = testing::memory_db().await;
        let accounts = Accounts::new(db);

        let actor = accounts.signup(account("carol", "carol@example.com")).await.unwrap();
        let logged_in = accounts
            .login(Credentials {
                username: "carol".into(),
                password: "password123".into(),
            })
            .await
            .unwrap();
        assert_eq!(actor, logged_in);

        let current = accounts.current(actor.user_id).await.unwrap().unwrap();
        assert_eq!(current.profile.nickname, "carol the great");
        assert_ne!(current.user.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let db = testing::memory_db().await;
        let accounts = Accounts::new(db);
        accounts.signup(account("dave", "dave@example.com")).await.unwrap();

        let wrong_password = field_errors(
            accounts
                .login(Credentials {
                    username: "dave".into(),
                    password: "nope-nope".into(),
                })
                .await
                .unwrap_err(),
        );
        let unknown_user = field_errors(
            accounts
                .login(Credentials {
                    username: "nobody".into(),
                    password: "password123".into(),
                })
                .await
                .unwrap_err(),
        );
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.non_field_errors().next(), Some(INVALID_LOGIN));
    }

    #[tokio::test]
    async fn test_signup_rejects_taken_username_and_email() {
        let db = testing::memory_db().await;
        let accounts = Accounts::new(db);
        accounts.signup(account("erin", "erin@example.com")).await.unwrap();

        let errors = field_errors(
            accounts
                .signup(account("erin", "erin@example.com"))
                .await
                .unwrap_err(),
        );
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
    }

    #[tokio::test]
    async fn test_edit_profile() {
        let db = testing::memory_db().await;
        let accounts = Accounts::new(db.clone());
        let frank = accounts.signup(account("frank", "frank@example.com")).await.unwrap();
        accounts.signup(account("gina", "gina@example.com")).await.unwrap();

        // keeping one's own email is fine
        accounts
            .edit_profile(
                frank,
                ProfileChanges {
                    email: "frank@example.com".into(),
                    nickname: "Franky".into(),
                    avatar: Some("avatars/frank.png".into()),
                },
            )
            .await
            .unwrap();
        let current = accounts.current(frank.user_id).await.unwrap().unwrap();
        assert_eq!(current.profile.nickname, "Franky");
        assert_eq!(current.profile.avatar.as_deref(), Some("avatars/frank.png"));

        let err = accounts
            .edit_profile(
                frank,
                ProfileChanges {
                    email: "gina@example.com".into(),
                    nickname: "Franky".into(),
                    avatar: None,
                },
            )
            .await
            .unwrap_err();
        assert!(field_errors(err).get("email").is_some());
    }

    #[tokio::test]
    async fn test_current_for_unknown_id() {
        let db = testing::memory_db().await;
        let accounts = Accounts::new(db);
        assert!(accounts.current(Uuid::new_v4()).await.unwrap().is_none());
    }
}
