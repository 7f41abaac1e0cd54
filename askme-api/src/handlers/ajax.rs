//! JSON endpoints used by the vote buttons and the approval checkbox.

use crate::session::Viewer;
use askme_app::application::forms::{
    parse_target_id, parse_vote_kind, ApprovePayload, DeleteAnswerPayload, LikeAnswerPayload,
    LikeQuestionPayload,
};
use askme_app::domain::{VoteKind, VoteTarget};
use askme_app::AppContext;
use askme_errors::AppError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    status: &'static str,
    rating: i32,
    vote: Option<VoteKind>,
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    status: &'static str,
    is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct AnswersCountResponse {
    status: &'static str,
    answers_count: i32,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

pub async fn like_question(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    payload: Result<Json<LikeQuestionPayload>, JsonRejection>,
) -> Result<Json<RatingResponse>, AppError> {
    let actor = viewer.require()?;
    let payload = body(payload)?;
    let question_id = parse_target_id(payload.question_id.as_deref(), "Question")?;
    let target = VoteTarget::Question(question_id);
    ctx.votes.ensure_target(target).await?;
    let kind = parse_vote_kind(payload.kind.as_deref())?;

    let result = ctx.votes.vote(actor, target, kind).await?;
    Ok(Json(RatingResponse {
        status: "success",
        rating: result.rating,
        vote: result.vote,
    }))
}

pub async fn like_answer(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    payload: Result<Json<LikeAnswerPayload>, JsonRejection>,
) -> Result<Json<RatingResponse>, AppError> {
    let actor = viewer.require()?;
    let payload = body(payload)?;
    let answer_id = parse_target_id(payload.answer_id.as_deref(), "Answer")?;
    let target = VoteTarget::Answer(answer_id);
    ctx.votes.ensure_target(target).await?;
    let kind = parse_vote_kind(payload.kind.as_deref())?;

    let result = ctx.votes.vote(actor, target, kind).await?;
    Ok(Json(RatingResponse {
        status: "success",
        rating: result.rating,
        vote: result.vote,
    }))
}

pub async fn unlike_question(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    payload: Result<Json<LikeQuestionPayload>, JsonRejection>,
) -> Result<Json<RatingResponse>, AppError> {
    let actor = viewer.require()?;
    let payload = body(payload)?;
    let question_id = parse_target_id(payload.question_id.as_deref(), "Question")?;

    let result = ctx
        .votes
        .retract(actor, VoteTarget::Question(question_id))
        .await?;
    Ok(Json(RatingResponse {
        status: "success",
        rating: result.rating,
        vote: None,
    }))
}

pub async fn unlike_answer(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    payload: Result<Json<LikeAnswerPayload>, JsonRejection>,
) -> Result<Json<RatingResponse>, AppError> {
    let actor = viewer.require()?;
    let payload = body(payload)?;
    let answer_id = parse_target_id(payload.answer_id.as_deref(), "Answer")?;

    let result = ctx
        .votes
        .retract(actor, VoteTarget::Answer(answer_id))
        .await?;
    Ok(Json(RatingResponse {
        status: "success",
        rating: result.rating,
        vote: None,
    }))
}

pub async fn approve_answer(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    payload: Result<Json<ApprovePayload>, JsonRejection>,
) -> Result<Json<ApprovalResponse>, AppError> {
    let actor = viewer.require()?;
    let payload = body(payload)?;
    let answer_id = parse_target_id(payload.answer_id.as_deref(), "Answer or question")?;
    let question_id = parse_target_id(payload.question_id.as_deref(), "Answer or question")?;

    let is_correct = ctx
        .answers
        .toggle_approval(actor, question_id, answer_id)
        .await?;
    Ok(Json(ApprovalResponse {
        status: "success",
        is_correct,
    }))
}

pub async fn delete_answer(
    State(ctx): State<AppContext>,
    viewer: Viewer,
    payload: Result<Json<DeleteAnswerPayload>, JsonRejection>,
) -> Result<Json<AnswersCountResponse>, AppError> {
    let actor = viewer.require()?;
    let payload = body(payload)?;
    let answer_id = parse_target_id(payload.answer_id.as_deref(), "Answer")?;

    let answers_count = ctx.answers.delete(actor, answer_id).await?;
    Ok(Json(AnswersCountResponse {
        status: "success",
        answers_count,
    }))
}
