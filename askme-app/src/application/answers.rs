use crate::domain::{Actor, PostedAnswer};
use crate::infrastructure::db::entities::{Answer, Question};
use crate::infrastructure::db::{answer_repository, counters, AnswerRepository};
use askme_errors::AppError;
use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait};
use uuid::Uuid;

/// Answer lifecycle: posting and deleting keep `answers_count` of the parent
/// question in step; approval is a plain flag flip.
#[derive(Clone)]
pub struct AnswerService {
    db: DatabaseConnection,
    answers: AnswerRepository,
}

impl AnswerService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            answers: AnswerRepository::new(db.clone()),
            db,
        }
    }

    pub async fn post(
        &self,
        actor: Actor,
        question_id: Uuid,
        content: String,
    ) -> Result<PostedAnswer, AppError> {
        let txn = self.db.begin().await?;

        if Question::find_by_id(question_id).one(&txn).await?.is_none() {
            return Err(AppError::not_found("Question"));
        }
        let answer =
            answer_repository::insert(&txn, question_id, actor.user_id, content, chrono::Utc::now())
                .await?;
        let answers_count = counters::shift_answers_count(&txn, question_id, 1).await?;

        txn.commit().await?;
        tracing::info!(
            answer_id = %answer.id,
            question_id = %question_id,
            user_id = %actor.user_id,
            answers_count,
            "Answer posted"
        );
        Ok(PostedAnswer {
            answer_id: answer.id,
            question_id,
            answers_count,
        })
    }

    /// Deletes one of the actor's own answers. Its likes go with it by cascade.
    pub async fn delete(&self, actor: Actor, answer_id: Uuid) -> Result<i32, AppError> {
        let txn = self.db.begin().await?;

        let answer = Answer::find_by_id(answer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Answer"))?;
        if answer.author_id != actor.user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete an answer".to_string(),
            ));
        }

        let answers_count = remove_in(&txn, answer_id, answer.question_id).await?;

        txn.commit().await?;
        tracing::info!(
            answer_id = %answer_id,
            question_id = %answer.question_id,
            answers_count,
            "Answer deleted"
        );
        Ok(answers_count)
    }

    /// Flips `is_correct`. Only the question's author may do this, and the
    /// answer has to belong to that question.
    pub async fn toggle_approval(
        &self,
        actor: Actor,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> Result<bool, AppError> {
        let answer = self.answers.find_by_id(answer_id).await?;
        let question = Question::find_by_id(question_id).one(&self.db).await?;
        let (answer, question) = match (answer, question) {
            (Some(a), Some(q)) if a.question_id == q.id => (a, q),
            _ => return Err(AppError::not_found("Answer or question")),
        };

        if question.author_id != actor.user_id {
            return Err(AppError::Forbidden(
                "Only question author can approve answers".to_string(),
            ));
        }

        let is_correct = !answer.is_correct;
        self.answers.set_correct(answer.id, is_correct).await?;
        tracing::info!(answer_id = %answer.id, is_correct, "Answer approval toggled");
        Ok(is_correct)
    }
}

/// Deletes the answer row and decrements the question's `answers_count`,
/// unless a concurrent request deleted the row first.
async fn remove_in(
    txn: &DatabaseTransaction,
    answer_id: Uuid,
    question_id: Uuid,
) -> Result<i32, AppError> {
    if answer_repository::delete(txn, answer_id).await? == 0 {
        return Err(AppError::not_found("Answer"));
    }
    Ok(counters::shift_answers_count(txn, question_id, -1).await?)
}
