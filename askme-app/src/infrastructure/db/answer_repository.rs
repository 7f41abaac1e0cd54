use super::entities::{answer, Answer};
use super::fetch_page;
use crate::domain::{PageInfo, PageRequest};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, PaginatorTrait};
use uuid::Uuid;

#[derive(Clone)]
pub struct AnswerRepository {
    db: DatabaseConnection,
}

impl AnswerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<answer::Model>, DbErr> {
        Answer::find_by_id(id).one(&self.db).await
    }

    /// Answers of a question, oldest first.
    pub async fn for_question(
        &self,
        question_id: Uuid,
        page: PageRequest,
        per_page: u64,
    ) -> Result<(Vec<answer::Model>, PageInfo), DbErr> {
        let select = Answer::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .order_by_asc(answer::Column::CreatedAt)
            .order_by_asc(answer::Column::Id);
        fetch_page(&self.db, select, page, per_page).await
    }

    pub async fn count_by_author(&self, user_id: Uuid) -> Result<u64, DbErr> {
        Answer::find()
            .filter(answer::Column::AuthorId.eq(user_id))
            .count(&self.db)
            .await
    }

    /// Sum of answer ratings per author.
    pub async fn rating_sums_by_author(&self) -> Result<Vec<(Uuid, i64)>, DbErr> {
        Answer::find()
            .select_only()
            .column(answer::Column::AuthorId)
            .column_as(Expr::col(answer::Column::Rating).sum(), "total")
            .group_by(answer::Column::AuthorId)
            .into_tuple::<(Uuid, i64)>()
            .all(&self.db)
            .await
    }

    pub async fn set_correct(&self, id: Uuid, is_correct: bool) -> Result<(), DbErr> {
        let result = Answer::update_many()
            .col_expr(answer::Column::IsCorrect, Expr::value(is_correct))
            .filter(answer::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound("Answer".to_string()));
        }
        Ok(())
    }
}

/// Overwrites the cached rating. Only used to repair drift.
pub(crate) async fn store_rating<C>(conn: &C, id: Uuid, rating: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    Answer::update_many()
        .col_expr(answer::Column::Rating, Expr::value(rating))
        .filter(answer::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

pub(crate) async fn insert<C>(
    conn: &C,
    question_id: Uuid,
    author_id: Uuid,
    content: String,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Result<answer::Model, DbErr>
where
    C: ConnectionTrait,
{
    answer::ActiveModel {
        id: Set(Uuid::new_v4()),
        content: Set(content),
        question_id: Set(question_id),
        author_id: Set(author_id),
        is_correct: Set(false),
        rating: Set(0),
        created_at: Set(created_at),
    }
    .insert(conn)
    .await
}

pub(crate) async fn delete<C>(conn: &C, id: Uuid) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    Ok(Answer::delete_by_id(id).exec(conn).await?.rows_affected)
}
