use super::{page, PageError};
use crate::render;
use crate::session::Viewer;
use askme_app::application::forms::{LoginForm, ProfileEditForm, SignupForm};
use askme_app::infrastructure::security::InputSanitizer;
use askme_app::AppContext;
use askme_errors::{AppError, FieldErrors};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SavedQuery {
    pub saved: Option<String>,
}

pub async fn login(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Query(query): Query<NextQuery>,
) -> Result<Response, PageError> {
    if viewer.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    let content = render::login_form(&form, &FieldErrors::new());
    Ok(page(&ctx, &viewer, "Log In", &content).await?.into_response())
}

pub async fn post_login(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    if viewer.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let result = match form.clean() {
        Ok(credentials) => ctx.accounts.login(credentials).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(actor) => {
            viewer.sign_in(actor).await?;
            let target = InputSanitizer::redirect_or_default(form.next.as_deref());
            Ok(Redirect::to(&target).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let content = render::login_form(&form, &errors);
            Ok(page(&ctx, &viewer, "Log In", &content).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn signup(State(ctx): State<AppContext>, viewer: Viewer) -> Result<Response, PageError> {
    if viewer.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    let content = render::signup_form(&SignupForm::default(), &FieldErrors::new());
    Ok(page(&ctx, &viewer, "Registration", &content).await?.into_response())
}

/// Creates the account and signs the new user in.
pub async fn post_signup(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Form(form): Form<SignupForm>,
) -> Result<Response, PageError> {
    if viewer.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let result = match form.clean() {
        Ok(account) => ctx.accounts.signup(account).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(actor) => {
            viewer.sign_in(actor).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AppError::Validation(errors)) => {
            let content = render::signup_form(&form, &errors);
            Ok(page(&ctx, &viewer, "Registration", &content).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(viewer: Viewer) -> Result<Response, PageError> {
    if let Some(actor) = viewer.actor() {
        tracing::info!(user_id = %actor.user_id, "User logged out");
    }
    viewer.sign_out().await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn profile_edit(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Query(query): Query<SavedQuery>,
) -> Result<Response, PageError> {
    let Some(current) = viewer.user.as_ref() else {
        return Err(PageError::login_required("/profile/edit/"));
    };
    let form = ProfileEditForm {
        email: current.user.email.clone(),
        nickname: current.profile.nickname.clone(),
        avatar: current.profile.avatar.clone(),
    };
    let content = render::profile_edit_form(&form, &FieldErrors::new(), query.saved.is_some());
    Ok(page(&ctx, &viewer, "Settings", &content).await?.into_response())
}

pub async fn post_profile_edit(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Form(form): Form<ProfileEditForm>,
) -> Result<Response, PageError> {
    let Some(actor) = viewer.actor() else {
        return Err(PageError::login_required("/profile/edit/"));
    };

    let result = match form.clean() {
        Ok(changes) => ctx.accounts.edit_profile(actor, changes).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(Redirect::to("/profile/edit/?saved=1").into_response()),
        Err(AppError::Validation(errors)) => {
            let content = render::profile_edit_form(&form, &errors, false);
            Ok(page(&ctx, &viewer, "Settings", &content).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}
