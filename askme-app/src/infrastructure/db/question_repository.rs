use super::entities::{question, question_tag, tag, Question, QuestionTag};
use super::{fetch_page, tag_repository};
use crate::domain::{PageInfo, PageRequest};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, JoinType, PaginatorTrait, TransactionTrait};
use uuid::Uuid;

#[derive(Clone)]
pub struct QuestionRepository {
    db: DatabaseConnection,
}

impl QuestionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts the question and links its tags, creating missing tags.
    pub async fn create(
        &self,
        author_id: Uuid,
        title: String,
        content: String,
        tags: &[String],
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<question::Model, DbErr> {
        let txn = self.db.begin().await?;

        let question = question::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            content: Set(content),
            author_id: Set(author_id),
            rating: Set(0),
            answers_count: Set(0),
            created_at: Set(created_at),
        }
        .insert(&txn)
        .await?;

        for name in tags {
            let tag = tag_repository::get_or_create(&txn, name).await?;
            QuestionTag::insert(question_tag::ActiveModel {
                question_id: Set(question.id),
                tag_id: Set(tag.id),
            })
            .exec_without_returning(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(question)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<question::Model>, DbErr> {
        Question::find_by_id(id).one(&self.db).await
    }

    pub async fn newest(
        &self,
        page: PageRequest,
        per_page: u64,
    ) -> Result<(Vec<question::Model>, PageInfo), DbErr> {
        let select = Question::find()
            .order_by_desc(question::Column::CreatedAt)
            .order_by_desc(question::Column::Id);
        fetch_page(&self.db, select, page, per_page).await
    }

    /// Highest rating first, newer first among equals.
    pub async fn hottest(
        &self,
        page: PageRequest,
        per_page: u64,
    ) -> Result<(Vec<question::Model>, PageInfo), DbErr> {
        let select = Question::find()
            .order_by_desc(question::Column::Rating)
            .order_by_desc(question::Column::CreatedAt)
            .order_by_desc(question::Column::Id);
        fetch_page(&self.db, select, page, per_page).await
    }

    pub async fn by_tag(
        &self,
        tag_name: &str,
        page: PageRequest,
        per_page: u64,
    ) -> Result<(Vec<question::Model>, PageInfo), DbErr> {
        let select = Question::find()
            .join(JoinType::InnerJoin, question::Relation::QuestionTags.def())
            .join(JoinType::InnerJoin, question_tag::Relation::Tag.def())
            .filter(tag::Column::Name.eq(tag_name))
            .order_by_desc(question::Column::CreatedAt)
            .order_by_desc(question::Column::Id);
        fetch_page(&self.db, select, page, per_page).await
    }

    pub async fn count_by_author(&self, user_id: Uuid) -> Result<u64, DbErr> {
        Question::find()
            .filter(question::Column::AuthorId.eq(user_id))
            .count(&self.db)
            .await
    }

    /// Sum of question ratings per author.
    pub async fn rating_sums_by_author(&self) -> Result<Vec<(Uuid, i64)>, DbErr> {
        Question::find()
            .select_only()
            .column(question::Column::AuthorId)
            .column_as(Expr::col(question::Column::Rating).sum(), "total")
            .group_by(question::Column::AuthorId)
            .into_tuple::<(Uuid, i64)>()
            .all(&self.db)
            .await
    }

    /// Overwrites both cached counters. Only used to repair drift.
    pub async fn store_counters(
        &self,
        question_id: Uuid,
        rating: i32,
        answers_count: i32,
    ) -> Result<(), DbErr> {
        store_counters(&self.db, question_id, rating, answers_count).await
    }
}

/// Number of live answers, counted from the rows.
pub(crate) async fn count_answers<C>(conn: &C, question_id: Uuid) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    super::entities::Answer::find()
        .filter(super::entities::answer::Column::QuestionId.eq(question_id))
        .count(conn)
        .await
}

pub(crate) async fn store_counters<C>(
    conn: &C,
    question_id: Uuid,
    rating: i32,
    answers_count: i32,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    Question::update_many()
        .col_expr(question::Column::Rating, Expr::value(rating))
        .col_expr(question::Column::AnswersCount, Expr::value(answers_count))
        .filter(question::Column::Id.eq(question_id))
        .exec(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::testing;

    #[tokio::test]
    async fn test_create_links_tags_once() {
        let db = testing::memory_db().await;
        let repo = QuestionRepository::new(db.clone());
        let alice = testing::seed_user(&db, "alice").await;

        let tags = vec!["rust".to_string(), "sql".to_string()];
        let first = repo
            .create(alice.id, "T1".into(), "body".into(), &tags, testing::at(1))
            .await
            .unwrap();
        repo.create(alice.id, "T2".into(), "body".into(), &tags[..1], testing::at(2))
            .await
            .unwrap();

        assert_eq!(tag::Entity::find().count(&db).await.unwrap(), 2);
        let (rust, info) = repo.by_tag("rust", PageRequest::first(), 5).await.unwrap();
        assert_eq!(info.total_items, 2);
        assert_eq!(rust[1].id, first.id);

        let (sql, _) = repo.by_tag("sql", PageRequest::first(), 5).await.unwrap();
        assert_eq!(sql.len(), 1);
        let (none, _) = repo.by_tag("go", PageRequest::first(), 5).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_newest_and_pagination() {
        let db = testing::memory_db().await;
        let repo = QuestionRepository::new(db.clone());
        let alice = testing::seed_user(&db, "alice").await;
        for i in 0..7 {
            testing::seed_question(&db, alice.id, &format!("Q{i}"), i).await;
        }

        let (items, info) = repo.newest(PageRequest::first(), 5).await.unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].title, "Q6");
        assert_eq!(info.num_pages, 2);

        let (items, info) = repo.newest(PageRequest::number(99), 5).await.unwrap();
        assert_eq!(info.number, 2);
        assert_eq!(items.iter().map(|q| q.title.as_str()).collect::<Vec<_>>(), ["Q1", "Q0"]);
    }
}
