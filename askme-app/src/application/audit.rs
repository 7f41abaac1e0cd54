//! Offline consistency checks for the cached counters. Request handlers never
//! call into this module; the counters are only ever shifted by deltas there.
//! The server runs a repair pass at boot when `RECONCILE_COUNTERS` is set.

use crate::domain::VoteTarget;
use crate::infrastructure::db::entities::{answer, question, Answer, Question};
use crate::infrastructure::db::{answer_repository, question_repository, vote_repository};
use askme_errors::AppError;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, QuerySelect, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

/// Cached and recomputed values of one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterCheck {
    pub cached: i32,
    pub actual: i32,
}

impl CounterCheck {
    pub fn drifted(&self) -> bool {
        self.cached != self.actual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionAudit {
    pub question_id: Uuid,
    pub rating: CounterCheck,
    pub answers_count: CounterCheck,
}

impl QuestionAudit {
    pub fn drifted(&self) -> bool {
        self.rating.drifted() || self.answers_count.drifted()
    }
}

/// Totals of one full pass over every question and answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub questions: u64,
    pub answers: u64,
    pub drifted: u64,
}

#[derive(Clone)]
pub struct CounterAudit {
    db: DatabaseConnection,
}

impl CounterAudit {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn check_question(&self, question_id: Uuid) -> Result<QuestionAudit, AppError> {
        question_audit(&self.db, question_id, false).await
    }

    pub async fn check_answer(&self, answer_id: Uuid) -> Result<CounterCheck, AppError> {
        answer_audit(&self.db, answer_id, false).await
    }

    /// Rewrites drifted question counters from the rows. Returns the audit as
    /// it was before the repair.
    ///
    /// The question row stays locked from the recount until the rewrite
    /// commits, so a vote or answer landing meanwhile waits for the repair
    /// and applies its delta on top of it.
    pub async fn reconcile_question(&self, question_id: Uuid) -> Result<QuestionAudit, AppError> {
        let txn = self.db.begin().await?;
        let audit = question_audit(&txn, question_id, true).await?;
        if audit.drifted() {
            tracing::warn!(
                question_id = %question_id,
                cached_rating = audit.rating.cached,
                rating = audit.rating.actual,
                cached_answers = audit.answers_count.cached,
                answers = audit.answers_count.actual,
                "Question counters drifted, repairing"
            );
            question_repository::store_counters(
                &txn,
                question_id,
                audit.rating.actual,
                audit.answers_count.actual,
            )
            .await?;
        }
        txn.commit().await?;
        Ok(audit)
    }

    pub async fn reconcile_answer(&self, answer_id: Uuid) -> Result<CounterCheck, AppError> {
        let txn = self.db.begin().await?;
        let check = answer_audit(&txn, answer_id, true).await?;
        if check.drifted() {
            tracing::warn!(
                answer_id = %answer_id,
                cached = check.cached,
                actual = check.actual,
                "Answer rating drifted, repairing"
            );
            answer_repository::store_rating(&txn, answer_id, check.actual).await?;
        }
        txn.commit().await?;
        Ok(check)
    }

    /// Checks every question and answer. With `repair` set, drifted counters
    /// are rewritten one row at a time.
    pub async fn run(&self, repair: bool) -> Result<AuditReport, AppError> {
        let mut report = AuditReport::default();

        let question_ids: Vec<Uuid> = Question::find()
            .select_only()
            .column(question::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;
        for id in question_ids {
            let audit = if repair {
                self.reconcile_question(id).await
            } else {
                self.check_question(id).await
            };
            match audit {
                Ok(audit) if audit.drifted() => report.drifted += 1,
                Ok(_) => {}
                // deleted since the id list was read
                Err(AppError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
            report.questions += 1;
        }

        let answer_ids: Vec<Uuid> = Answer::find()
            .select_only()
            .column(answer::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;
        for id in answer_ids {
            let check = if repair {
                self.reconcile_answer(id).await
            } else {
                self.check_answer(id).await
            };
            match check {
                Ok(check) if check.drifted() => report.drifted += 1,
                Ok(_) => {}
                Err(AppError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
            report.answers += 1;
        }

        tracing::info!(
            questions = report.questions,
            answers = report.answers,
            drifted = report.drifted,
            repair,
            "Counter audit finished"
        );
        Ok(report)
    }
}

async fn question_audit<C>(conn: &C, question_id: Uuid, lock: bool) -> Result<QuestionAudit, AppError>
where
    C: ConnectionTrait,
{
    let mut select = Question::find_by_id(question_id);
    if lock {
        select = select.lock_exclusive();
    }
    let question = select
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Question"))?;

    let rating = vote_repository::tally(conn, VoteTarget::Question(question_id)).await?;
    let answers = question_repository::count_answers(conn, question_id).await?;

    Ok(QuestionAudit {
        question_id,
        rating: CounterCheck {
            cached: question.rating,
            actual: rating,
        },
        answers_count: CounterCheck {
            cached: question.answers_count,
            actual: i32::try_from(answers)
                .map_err(|_| AppError::Internal("answers_count overflow".to_string()))?,
        },
    })
}

async fn answer_audit<C>(conn: &C, answer_id: Uuid, lock: bool) -> Result<CounterCheck, AppError>
where
    C: ConnectionTrait,
{
    let mut select = Answer::find_by_id(answer_id);
    if lock {
        select = select.lock_exclusive();
    }
    let answer = select
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Answer"))?;
    let actual = vote_repository::tally(conn, VoteTarget::Answer(answer_id)).await?;
    Ok(CounterCheck {
        cached: answer.rating,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{AnswerService, VoteService};
    use crate::domain::{Actor, VoteKind};
    use crate::infrastructure::db::{testing, QuestionRepository};

    #[tokio::test]
    async fn test_maintained_counters_do_not_drift() {
        let db = testing::memory_db().await;
        let audit = CounterAudit::new(db.clone());
        let asker = Actor::new(testing::seed_user(&db, "asker").await.id);
        let voter = Actor::new(testing::seed_user(&db, "voter").await.id);
        let question = testing::seed_question(&db, asker.user_id, "Q", 0).await;

        let posted = AnswerService::new(db.clone())
            .post(voter, question.id, "A".into())
            .await
            .unwrap();
        let votes = VoteService::new(db.clone());
        votes
            .vote(voter, VoteTarget::Question(question.id), VoteKind::Like)
            .await
            .unwrap();
        votes
            .vote(asker, VoteTarget::Answer(posted.answer_id), VoteKind::Dislike)
            .await
            .unwrap();

        assert!(!audit.check_question(question.id).await.unwrap().drifted());
        assert!(!audit.check_answer(posted.answer_id).await.unwrap().drifted());
    }

    #[tokio::test]
    async fn test_reconcile_repairs_drift() {
        let db = testing::memory_db().await;
        let audit = CounterAudit::new(db.clone());
        let asker = testing::seed_user(&db, "asker").await;
        let question = testing::seed_question(&db, asker.id, "Q", 0).await;

        let repo = QuestionRepository::new(db.clone());
        repo.store_counters(question.id, 12, 3).await.unwrap();

        let before = audit.reconcile_question(question.id).await.unwrap();
        assert_eq!(before.rating, CounterCheck { cached: 12, actual: 0 });
        assert_eq!(before.answers_count, CounterCheck { cached: 3, actual: 0 });

        let stored = repo.find_by_id(question.id).await.unwrap().unwrap();
        assert_eq!((stored.rating, stored.answers_count), (0, 0));
        assert!(!audit.check_question(question.id).await.unwrap().drifted());
    }

    #[tokio::test]
    async fn test_run_reports_then_repairs_every_row() {
        let db = testing::memory_db().await;
        let audit = CounterAudit::new(db.clone());
        let asker = Actor::new(testing::seed_user(&db, "asker").await.id);
        let helper = Actor::new(testing::seed_user(&db, "helper").await.id);
        let drifting = testing::seed_question(&db, asker.user_id, "Drifting", 0).await;
        let clean = testing::seed_question(&db, asker.user_id, "Clean", 1).await;
        let posted = AnswerService::new(db.clone())
            .post(helper, clean.id, "A".into())
            .await
            .unwrap();

        QuestionRepository::new(db.clone())
            .store_counters(drifting.id, 4, 0)
            .await
            .unwrap();
        answer_repository::store_rating(&db, posted.answer_id, -2).await.unwrap();

        let report = audit.run(false).await.unwrap();
        assert_eq!(
            report,
            AuditReport {
                questions: 2,
                answers: 1,
                drifted: 2
            }
        );
        assert!(audit.check_answer(posted.answer_id).await.unwrap().drifted());

        assert_eq!(audit.run(true).await.unwrap().drifted, 2);
        assert_eq!(audit.run(false).await.unwrap().drifted, 0);
        assert!(!audit.check_question(clean.id).await.unwrap().drifted());
    }
}
