use super::entities::{answer_like, question_like, Answer, AnswerLike, Question, QuestionLike};
use crate::domain::{VoteKind, VoteTarget};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, PaginatorTrait};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct VoteRepository {
    db: DatabaseConnection,
}

impl VoteRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteKind>, DbErr> {
        find(&self.db, user_id, target).await
    }

    /// The viewer's vote on each of the given questions, in one query.
    pub async fn kinds_for_questions(
        &self,
        user_id: Uuid,
        question_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, VoteKind>, DbErr> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = QuestionLike::find()
            .filter(question_like::Column::AuthorId.eq(user_id))
            .filter(question_like::Column::QuestionId.is_in(question_ids.iter().copied()))
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| Ok((row.question_id, parse_kind(&row.kind)?)))
            .collect()
    }

    pub async fn kinds_for_answers(
        &self,
        user_id: Uuid,
        answer_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, VoteKind>, DbErr> {
        if answer_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = AnswerLike::find()
            .filter(answer_like::Column::AuthorId.eq(user_id))
            .filter(answer_like::Column::AnswerId.is_in(answer_ids.iter().copied()))
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| Ok((row.answer_id, parse_kind(&row.kind)?)))
            .collect()
    }

    /// Rating recomputed from the vote rows. Only for audits, listings use
    /// the cached column.
    pub async fn tally(&self, target: VoteTarget) -> Result<i32, DbErr> {
        tally(&self.db, target).await
    }

    /// Number of vote rows a user holds on a target (0 or 1 while the
    /// uniqueness guard holds).
    pub async fn count_rows(&self, user_id: Uuid, target: VoteTarget) -> Result<u64, DbErr> {
        match target {
            VoteTarget::Question(id) => {
                QuestionLike::find()
                    .filter(question_like::Column::AuthorId.eq(user_id))
                    .filter(question_like::Column::QuestionId.eq(id))
                    .count(&self.db)
                    .await
            }
            VoteTarget::Answer(id) => {
                AnswerLike::find()
                    .filter(answer_like::Column::AuthorId.eq(user_id))
                    .filter(answer_like::Column::AnswerId.eq(id))
                    .count(&self.db)
                    .await
            }
        }
    }
}

pub(crate) async fn tally<C>(conn: &C, target: VoteTarget) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let kinds: Vec<String> = match target {
        VoteTarget::Question(id) => {
            QuestionLike::find()
                .select_only()
                .column(question_like::Column::Kind)
                .filter(question_like::Column::QuestionId.eq(id))
                .into_tuple()
                .all(conn)
                .await?
        }
        VoteTarget::Answer(id) => {
            AnswerLike::find()
                .select_only()
                .column(answer_like::Column::Kind)
                .filter(answer_like::Column::AnswerId.eq(id))
                .into_tuple()
                .all(conn)
                .await?
        }
    };

    kinds
        .iter()
        .map(|k| parse_kind(k).map(|kind| kind.delta()))
        .sum()
}

pub(crate) async fn find<C>(conn: &C, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteKind>, DbErr>
where
    C: ConnectionTrait,
{
    let kind = match target {
        VoteTarget::Question(id) => QuestionLike::find_by_id((user_id, id))
            .one(conn)
            .await?
            .map(|row| row.kind),
        VoteTarget::Answer(id) => AnswerLike::find_by_id((user_id, id))
            .one(conn)
            .await?
            .map(|row| row.kind),
    };
    kind.as_deref().map(parse_kind).transpose()
}

pub(crate) async fn insert<C>(
    conn: &C,
    user_id: Uuid,
    target: VoteTarget,
    kind: VoteKind,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    match target {
        VoteTarget::Question(id) => {
            QuestionLike::insert(question_like::ActiveModel {
                author_id: Set(user_id),
                question_id: Set(id),
                kind: Set(kind.as_str().to_string()),
                created_at: Set(now),
            })
            .exec_without_returning(conn)
            .await?;
        }
        VoteTarget::Answer(id) => {
            AnswerLike::insert(answer_like::ActiveModel {
                author_id: Set(user_id),
                answer_id: Set(id),
                kind: Set(kind.as_str().to_string()),
                created_at: Set(now),
            })
            .exec_without_returning(conn)
            .await?;
        }
    }
    Ok(())
}

/// Deletes the user's vote on `target`, returning how many rows went away.
pub(crate) async fn remove<C>(conn: &C, user_id: Uuid, target: VoteTarget) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = match target {
        VoteTarget::Question(id) => {
            QuestionLike::delete_many()
                .filter(question_like::Column::AuthorId.eq(user_id))
                .filter(question_like::Column::QuestionId.eq(id))
                .exec(conn)
                .await?
        }
        VoteTarget::Answer(id) => {
            AnswerLike::delete_many()
                .filter(answer_like::Column::AuthorId.eq(user_id))
                .filter(answer_like::Column::AnswerId.eq(id))
                .exec(conn)
                .await?
        }
    };
    Ok(result.rows_affected)
}

/// Existence check used before voting, so a missing target is reported as
/// such rather than as a foreign-key failure.
pub(crate) async fn target_exists<C>(conn: &C, target: VoteTarget) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let count = match target {
        VoteTarget::Question(id) => Question::find_by_id(id).count(conn).await?,
        VoteTarget::Answer(id) => Answer::find_by_id(id).count(conn).await?,
    };
    Ok(count > 0)
}

fn parse_kind(raw: &str) -> Result<VoteKind, DbErr> {
    raw.parse::<VoteKind>()
        .map_err(|e| DbErr::Type(e.to_string()))
}
