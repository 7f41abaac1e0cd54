use super::{or_not_found, page, PageError, PageQuery};
use crate::render;
use crate::session::Viewer;
use askme_app::application::forms::{AnswerForm, AskForm};
use askme_app::domain::PageRequest;
use askme_app::AppContext;
use askme_errors::{AppError, FieldErrors};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use uuid::Uuid;

const NEW_TABS: &str = r#"<a href="/hot/">Hot Questions</a>"#;
const HOT_TABS: &str = r#"<a href="/">New Questions</a>"#;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(what))
}

pub async fn index(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let request = PageRequest::parse(query.page.as_deref());
    let questions = ctx.feed.newest(viewer.actor(), request).await?;
    let content = render::question_list(
        "New Questions",
        NEW_TABS,
        &questions,
        "/",
        viewer.is_authenticated(),
    );
    Ok(page(&ctx, &viewer, "New Questions", &content).await?.into_response())
}

pub async fn hot(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let request = PageRequest::parse(query.page.as_deref());
    let questions = ctx.feed.hottest(viewer.actor(), request).await?;
    let content = render::question_list(
        "Hot Questions",
        HOT_TABS,
        &questions,
        "/hot/",
        viewer.is_authenticated(),
    );
    Ok(page(&ctx, &viewer, "Hot Questions", &content).await?.into_response())
}

pub async fn tag(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Path(name): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let result = tag_page(&ctx, &viewer, &name, &query).await;
    or_not_found(&ctx, &viewer, result).await
}

async fn tag_page(
    ctx: &AppContext,
    viewer: &Viewer,
    name: &str,
    query: &PageQuery,
) -> Result<Response, PageError> {
    let request = PageRequest::parse(query.page.as_deref());
    let questions = ctx.feed.by_tag(name, viewer.actor(), request).await?;
    let heading = format!("Tag: {}", name);
    let base_path = format!("/tag/{}/", urlencoding::encode(name));
    let content = render::question_list(
        &heading,
        NEW_TABS,
        &questions,
        &base_path,
        viewer.is_authenticated(),
    );
    Ok(page(ctx, viewer, &heading, &content).await?.into_response())
}

async fn render_question(
    ctx: &AppContext,
    viewer: &Viewer,
    question_id: Uuid,
    request: PageRequest,
    form: &AnswerForm,
    errors: &FieldErrors,
) -> Result<Response, PageError> {
    let detail = ctx
        .feed
        .question_detail(question_id, viewer.actor(), request)
        .await?;
    let content = render::question_detail(&detail, viewer.user.as_ref(), form, errors);
    Ok(page(ctx, viewer, &detail.question.title, &content)
        .await?
        .into_response())
}

pub async fn question(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let request = PageRequest::parse(query.page.as_deref());
    let result = match parse_id(&raw_id, "Question") {
        Ok(question_id) => {
            render_question(
                &ctx,
                &viewer,
                question_id,
                request,
                &AnswerForm::default(),
                &FieldErrors::new(),
            )
            .await
        }
        Err(e) => Err(e.into()),
    };
    or_not_found(&ctx, &viewer, result).await
}

/// Posts an answer and jumps to it on the last page of answers.
pub async fn post_answer(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
    Form(form): Form<AnswerForm>,
) -> Result<Response, PageError> {
    let result = answer_question(&ctx, &viewer, &raw_id, &form).await;
    or_not_found(&ctx, &viewer, result).await
}

async fn answer_question(
    ctx: &AppContext,
    viewer: &Viewer,
    raw_id: &str,
    form: &AnswerForm,
) -> Result<Response, PageError> {
    let question_id = parse_id(raw_id, "Question")?;
    let Some(actor) = viewer.actor() else {
        return Err(PageError::login_required(format!("/question/{}/", question_id)));
    };

    let text = match form.clean() {
        Ok(text) => text,
        Err(AppError::Validation(errors)) => {
            return render_question(ctx, viewer, question_id, PageRequest::first(), form, &errors)
                .await;
        }
        Err(e) => return Err(e.into()),
    };

    let posted = ctx.answers.post(actor, question_id, text).await?;
    let last_page = ctx.feed.last_answer_page(posted.answers_count);
    Ok(Redirect::to(&format!(
        "/question/{}/?page={}#answer_{}",
        question_id, last_page, posted.answer_id
    ))
    .into_response())
}

pub async fn ask(State(ctx): State<AppContext>, viewer: Viewer) -> Result<Response, PageError> {
    if !viewer.is_authenticated() {
        return Err(PageError::login_required("/ask/"));
    }
    let content = render::ask_form(&AskForm::default(), &FieldErrors::new());
    Ok(page(&ctx, &viewer, "Ask", &content).await?.into_response())
}

pub async fn post_question(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Form(form): Form<AskForm>,
) -> Result<Response, PageError> {
    let Some(actor) = viewer.actor() else {
        return Err(PageError::login_required("/ask/"));
    };

    match form.clean() {
        Ok(question) => {
            let id = ctx.questions.ask(actor, question).await?;
            Ok(Redirect::to(&format!("/question/{}/", id)).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let content = render::ask_form(&form, &errors);
            Ok(page(&ctx, &viewer, "Ask", &content).await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn profile(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
) -> Result<Response, PageError> {
    let result = profile_page(&ctx, &viewer, &raw_id).await;
    or_not_found(&ctx, &viewer, result).await
}

async fn profile_page(
    ctx: &AppContext,
    viewer: &Viewer,
    raw_id: &str,
) -> Result<Response, PageError> {
    let profile_id = parse_id(raw_id, "Profile")?;
    let details = ctx.feed.profile(profile_id).await?;
    let content = render::profile(&details);
    Ok(page(ctx, viewer, &details.nickname, &content)
        .await?
        .into_response())
}
