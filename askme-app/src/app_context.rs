use crate::application::{
    Accounts, AnswerService, CounterAudit, Feed, QuestionService, VoteService,
};
use crate::config::AppConfig;
use crate::infrastructure::db::{create_connection, run_migrations};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;

/// Everything a request handler needs. Cheap to clone; the services share one
/// connection pool.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub feed: Feed,
    pub votes: VoteService,
    pub answers: AnswerService,
    pub questions: QuestionService,
    pub accounts: Accounts,
    pub audit: CounterAudit,
}

impl AppContext {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        Self {
            feed: Feed::new(db.clone(), config.page_size),
            votes: VoteService::new(db.clone()),
            answers: AnswerService::new(db.clone()),
            questions: QuestionService::new(db.clone()),
            accounts: Accounts::new(db.clone()),
            audit: CounterAudit::new(db),
            config: Arc::new(config),
        }
    }

    /// Connects to the configured database and brings the schema up to date.
    pub async fn connect(config: AppConfig) -> Result<Self, DbErr> {
        let db = create_connection(&config.database_url).await?;
        run_migrations(&db).await?;
        tracing::info!("Database connected");
        Ok(Self::new(config, db))
    }
}
