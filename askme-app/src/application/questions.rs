use super::forms::NewQuestion;
use crate::domain::Actor;
use crate::infrastructure::db::QuestionRepository;
use askme_errors::AppError;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

#[derive(Clone)]
pub struct QuestionService {
    questions: QuestionRepository,
}

impl QuestionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            questions: QuestionRepository::new(db),
        }
    }

    /// Stores a cleaned question with its tags and returns the new id.
    pub async fn ask(&self, actor: Actor, question: NewQuestion) -> Result<Uuid, AppError> {
        let created = self
            .questions
            .create(
                actor.user_id,
                question.title,
                question.content,
                &question.tags,
                chrono::Utc::now(),
            )
            .await?;

        tracing::info!(
            question_id = %created.id,
            user_id = %actor.user_id,
            tags = question.tags.len(),
            "Question asked"
        );
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::{testing, TagRepository};

    #[tokio::test]
    async fn test_ask_starts_with_zero_counters() {
        let db = testing::memory_db().await;
        let service = QuestionService::new(db.clone());
        let actor = Actor::new(testing::seed_user(&db, "asker").await.id);

        let id = service
            .ask(
                actor,
                NewQuestion {
                    title: "Why borrowck?".into(),
                    content: "It rejects my code".into(),
                    tags: vec!["rust".into(), "borrowck".into()],
                },
            )
            .await
            .unwrap();

        let stored = QuestionRepository::new(db.clone())
            .find_by_id(id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.author_id, actor.user_id);
        assert_eq!((stored.rating, stored.answers_count), (0, 0));

        let tags = TagRepository::new(db).names_for_questions(&[id]).await.unwrap();
        assert_eq!(tags[&id], vec!["borrowck".to_string(), "rust".to_string()]);
    }
}
