pub mod entities;
pub(crate) mod answer_repository;
pub(crate) mod counters;
pub(crate) mod question_repository;
pub(crate) mod tag_repository;
pub(crate) mod user_repository;
pub(crate) mod vote_repository;

#[cfg(test)]
pub(crate) mod testing;

pub use answer_repository::AnswerRepository;
pub use question_repository::QuestionRepository;
pub use tag_repository::TagRepository;
pub use user_repository::{NewUser, UserRepository};
pub use vote_repository::VoteRepository;

use crate::domain::{PageInfo, PageRequest};
use entities::{answer, question, Answer, AnswerLike, Profile, Question, QuestionLike, QuestionTag, Tag, User};
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Schema, Select,
};
use std::time::Duration;

pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Database::connect(opt).await
}

/// Creates every table and index that does not exist yet, in foreign-key order.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Profile),
        schema.create_table_from_entity(Tag),
        schema.create_table_from_entity(Question),
        schema.create_table_from_entity(QuestionTag),
        schema.create_table_from_entity(Answer),
        schema.create_table_from_entity(QuestionLike),
        schema.create_table_from_entity(AnswerLike),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;
    }

    for index in indexes() {
        db.execute(backend.build(&index)).await?;
    }

    tracing::info!("Database schema is up to date");
    Ok(())
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .if_not_exists()
            .name("idx_questions_created_at")
            .table(Question)
            .col(question::Column::CreatedAt)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_questions_hot")
            .table(Question)
            .col(question::Column::Rating)
            .col(question::Column::CreatedAt)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_answers_question_created_at")
            .table(Answer)
            .col(answer::Column::QuestionId)
            .col(answer::Column::CreatedAt)
            .to_owned(),
    ]
}

/// Runs `select` for the requested page, clamping the page number to the
/// available range first.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    request: PageRequest,
    per_page: u64,
) -> Result<(Vec<E::Model>, PageInfo), DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let paginator = select.paginate(db, per_page.max(1));
    let total = paginator.num_items().await?;
    let info = request.resolve(total, per_page);
    let items = paginator.fetch_page(info.index()).await?;
    Ok((items, info))
}
