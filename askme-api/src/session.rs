use askme_app::application::CurrentUser;
use askme_app::domain::Actor;
use askme_app::AppContext;
use askme_errors::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;
use uuid::Uuid;

const USER_ID_KEY: &str = "user_id";

fn session_error(e: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("Session error: {}", e))
}

/// The session of the current request and the user signed into it, if any.
pub struct Viewer {
    session: Session,
    pub user: Option<CurrentUser>,
}

impl Viewer {
    pub fn actor(&self) -> Option<Actor> {
        self.user.as_ref().map(CurrentUser::actor)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The actor for endpoints that only make sense when signed in.
    pub fn require(&self) -> Result<Actor, AppError> {
        self.actor().ok_or(AppError::Unauthorized)
    }

    pub async fn sign_in(&self, actor: Actor) -> Result<(), AppError> {
        self.session.cycle_id().await.map_err(session_error)?;
        self.session
            .insert(USER_ID_KEY, actor.user_id)
            .await
            .map_err(session_error)
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.session.flush().await.map_err(session_error)
    }
}

impl FromRequestParts<AppContext> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;

        let user_id: Option<Uuid> = session.get(USER_ID_KEY).await.map_err(session_error)?;
        let user = match user_id {
            Some(id) => state.accounts.current(id).await?,
            None => None,
        };

        Ok(Self { session, user })
    }
}
