use crate::handlers::{account, ajax, feed};
use crate::render;
use askme_app::AppContext;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub fn router(ctx: AppContext) -> Router {
    let config = ctx.config.clone();

    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            config.session_inactivity_days,
        )));

    Router::new()
        .route("/", get(feed::index))
        .route("/hot/", get(feed::hot))
        .route("/tag/{name}/", get(feed::tag))
        .route(
            "/question/{id}/",
            get(feed::question).post(feed::post_answer),
        )
        .route("/ask/", get(feed::ask).post(feed::post_question))
        .route("/profile/{id}/", get(feed::profile))
        .route("/login/", get(account::login).post(account::post_login))
        .route("/signup/", get(account::signup).post(account::post_signup))
        .route("/logout/", get(account::logout))
        .route(
            "/profile/edit/",
            get(account::profile_edit).post(account::post_profile_edit),
        )
        .route("/like_question/", post(ajax::like_question))
        .route("/like_answer/", post(ajax::like_answer))
        .route("/unlike_question/", post(ajax::unlike_question))
        .route("/unlike_answer/", post(ajax::unlike_answer))
        .route("/approve_answer/", post(ajax::approve_answer))
        .route("/delete_answer/", post(ajax::delete_answer))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .fallback(fallback)
        .with_state(ctx)
        .layer(sessions)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(render::error_page(StatusCode::NOT_FOUND, "Page not found")),
    )
}
