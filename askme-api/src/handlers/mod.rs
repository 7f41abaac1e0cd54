pub mod account;
pub mod ajax;
pub mod feed;

use crate::render::{self, Chrome};
use crate::session::Viewer;
use askme_app::AppContext;
use askme_errors::AppError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Failure of an HTML page handler.
#[derive(Debug)]
pub enum PageError {
    /// Anonymous visitor on a members-only page; sent to the login form.
    LoginRequired { next: String },
    App(AppError),
}

impl PageError {
    pub fn login_required(next: impl Into<String>) -> Self {
        Self::LoginRequired { next: next.into() }
    }
}

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::LoginRequired { next } => {
                Redirect::to(&format!("/login/?next={}", urlencoding::encode(&next)))
                    .into_response()
            }
            PageError::App(err) => {
                let status = err.status_code();
                if err.is_server_error() {
                    tracing::error!(error = %err, "page failed");
                } else {
                    tracing::debug!(error = %err, "page rejected");
                }
                (status, Html(render::error_page(status, &err.user_message()))).into_response()
            }
        }
    }
}

/// Renders `content` inside the site layout, side panels included.
pub async fn page(
    ctx: &AppContext,
    viewer: &Viewer,
    title: &str,
    content: &str,
) -> Result<Html<String>, PageError> {
    let sidebar = ctx.feed.sidebar().await?;
    let chrome = Chrome {
        user: viewer.user.as_ref(),
        sidebar: &sidebar,
    };
    Ok(Html(render::layout(title, &chrome, content)))
}

/// 404 inside the regular layout, like any other page.
pub async fn not_found_page(
    ctx: &AppContext,
    viewer: &Viewer,
    message: &str,
) -> Result<Response, PageError> {
    let html = page(ctx, viewer, "Not found", &render::not_found(message)).await?;
    Ok((StatusCode::NOT_FOUND, html).into_response())
}

/// Turns a `NotFound` into the 404 page and passes every other result through.
pub async fn or_not_found(
    ctx: &AppContext,
    viewer: &Viewer,
    result: Result<Response, PageError>,
) -> Result<Response, PageError> {
    match result {
        Err(PageError::App(AppError::NotFound(what))) => {
            not_found_page(ctx, viewer, &format!("{} not found", what)).await
        }
        other => other,
    }
}
