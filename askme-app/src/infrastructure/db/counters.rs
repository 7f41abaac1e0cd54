//! Signed in-place updates of the denormalized counters.
//!
//! Callers run these on the same transaction as the row insert/delete they
//! account for, and only after that mutation reported a changed row: a
//! delete that lost a race to another request affects nothing and must not
//! be counted.

use super::entities::{answer, question, Answer, Question};
use crate::domain::VoteTarget;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

/// Adds `delta` to the target's rating and returns the new value.
pub async fn shift_rating<C>(conn: &C, target: VoteTarget, delta: i32) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let affected = match target {
        VoteTarget::Question(id) => {
            Question::update_many()
                .col_expr(
                    question::Column::Rating,
                    Expr::col(question::Column::Rating).add(delta),
                )
                .filter(question::Column::Id.eq(id))
                .exec(conn)
                .await?
                .rows_affected
        }
        VoteTarget::Answer(id) => {
            Answer::update_many()
                .col_expr(
                    answer::Column::Rating,
                    Expr::col(answer::Column::Rating).add(delta),
                )
                .filter(answer::Column::Id.eq(id))
                .exec(conn)
                .await?
                .rows_affected
        }
    };

    if affected == 0 {
        return Err(DbErr::RecordNotFound(target.label().to_string()));
    }
    current_rating(conn, target).await
}

pub async fn current_rating<C>(conn: &C, target: VoteTarget) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let rating = match target {
        VoteTarget::Question(id) => {
            Question::find_by_id(id)
                .select_only()
                .column(question::Column::Rating)
                .into_tuple::<i32>()
                .one(conn)
                .await?
        }
        VoteTarget::Answer(id) => {
            Answer::find_by_id(id)
                .select_only()
                .column(answer::Column::Rating)
                .into_tuple::<i32>()
                .one(conn)
                .await?
        }
    };
    rating.ok_or_else(|| DbErr::RecordNotFound(target.label().to_string()))
}

/// Adds `delta` to the question's answers_count and returns the new value.
pub async fn shift_answers_count<C>(conn: &C, question_id: Uuid, delta: i32) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let result = Question::update_many()
        .col_expr(
            question::Column::AnswersCount,
            Expr::col(question::Column::AnswersCount).add(delta),
        )
        .filter(question::Column::Id.eq(question_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound("Question".to_string()));
    }

    Question::find_by_id(question_id)
        .select_only()
        .column(question::Column::AnswersCount)
        .into_tuple::<i32>()
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Question".to_string()))
}
