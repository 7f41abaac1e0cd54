use crate::domain::{Actor, VoteKind, VoteResult, VoteTarget};
use crate::infrastructure::db::{counters, vote_repository};
use askme_errors::AppError;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};

/// Casts, changes and retracts likes while keeping the cached `rating` of
/// the target equal to the signed sum of its live votes.
///
/// Every operation runs the vote row mutation and the counter update on one
/// transaction; the counter is shifted by a delta and never recounted.
#[derive(Clone)]
pub struct VoteService {
    db: DatabaseConnection,
}

impl VoteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reports a missing question or answer as `NotFound` before anything
    /// about the vote itself is looked at.
    pub async fn ensure_target(&self, target: VoteTarget) -> Result<(), AppError> {
        target_present(&self.db, target).await
    }

    /// What the like endpoints do: cast when there is no vote yet, switch
    /// when the actor voted the other way, reject a repeat of the same vote.
    pub async fn vote(
        &self,
        actor: Actor,
        target: VoteTarget,
        kind: VoteKind,
    ) -> Result<VoteResult, AppError> {
        let txn = self.db.begin().await?;
        target_present(&txn, target).await?;

        let rating = match vote_repository::find(&txn, actor.user_id, target).await? {
            None => cast_in(&txn, actor, target, kind).await?,
            Some(existing) if existing == kind => {
                return Err(duplicate(target, kind));
            }
            Some(existing) => switch_in(&txn, actor, target, existing, kind).await?,
        };

        txn.commit().await?;
        Ok(VoteResult {
            vote: Some(kind),
            rating,
        })
    }

    /// Inserts a new vote. An existing vote for the pair is a conflict and
    /// leaves the rating untouched.
    pub async fn cast(
        &self,
        actor: Actor,
        target: VoteTarget,
        kind: VoteKind,
    ) -> Result<VoteResult, AppError> {
        let txn = self.db.begin().await?;
        target_present(&txn, target).await?;

        if vote_repository::find(&txn, actor.user_id, target).await?.is_some() {
            return Err(duplicate(target, kind));
        }
        let rating = cast_in(&txn, actor, target, kind).await?;

        txn.commit().await?;
        Ok(VoteResult {
            vote: Some(kind),
            rating,
        })
    }

    /// Replaces the actor's vote with `kind`: delete then reinsert, net ±2.
    pub async fn change(
        &self,
        actor: Actor,
        target: VoteTarget,
        kind: VoteKind,
    ) -> Result<VoteResult, AppError> {
        let txn = self.db.begin().await?;
        target_present(&txn, target).await?;

        let existing = vote_repository::find(&txn, actor.user_id, target)
            .await?
            .ok_or_else(|| AppError::not_found("Vote"))?;
        if existing == kind {
            return Err(duplicate(target, kind));
        }
        let rating = switch_in(&txn, actor, target, existing, kind).await?;

        txn.commit().await?;
        Ok(VoteResult {
            vote: Some(kind),
            rating,
        })
    }

    /// Removes the actor's vote and reverses its effect on the rating.
    pub async fn retract(&self, actor: Actor, target: VoteTarget) -> Result<VoteResult, AppError> {
        let txn = self.db.begin().await?;
        target_present(&txn, target).await?;

        let existing = vote_repository::find(&txn, actor.user_id, target)
            .await?
            .ok_or_else(|| AppError::not_found("Vote"))?;
        let rating = retract_in(&txn, actor, target, existing).await?;

        txn.commit().await?;
        Ok(VoteResult { vote: None, rating })
    }
}

async fn target_present<C>(conn: &C, target: VoteTarget) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    if vote_repository::target_exists(conn, target).await? {
        Ok(())
    } else {
        Err(AppError::not_found(target.label()))
    }
}

/// Deletes the actor's vote row. Zero deleted rows means a concurrent
/// request already removed it, so there is nothing to undo.
async fn remove_in(
    txn: &DatabaseTransaction,
    actor: Actor,
    target: VoteTarget,
) -> Result<(), AppError> {
    if vote_repository::remove(txn, actor.user_id, target).await? == 0 {
        return Err(AppError::not_found("Vote"));
    }
    Ok(())
}

async fn retract_in(
    txn: &DatabaseTransaction,
    actor: Actor,
    target: VoteTarget,
    existing: VoteKind,
) -> Result<i32, AppError> {
    remove_in(txn, actor, target).await?;
    let rating = counters::shift_rating(txn, target, -existing.delta()).await?;

    tracing::info!(
        user_id = %actor.user_id,
        target = ?target,
        kind = %existing,
        rating,
        "Vote retracted"
    );
    Ok(rating)
}

async fn cast_in(
    txn: &DatabaseTransaction,
    actor: Actor,
    target: VoteTarget,
    kind: VoteKind,
) -> Result<i32, AppError> {
    vote_repository::insert(txn, actor.user_id, target, kind)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => duplicate(target, kind),
            other => other,
        })?;
    let rating = counters::shift_rating(txn, target, kind.delta()).await?;

    tracing::info!(user_id = %actor.user_id, target = ?target, kind = %kind, rating, "Vote cast");
    Ok(rating)
}

async fn switch_in(
    txn: &DatabaseTransaction,
    actor: Actor,
    target: VoteTarget,
    from: VoteKind,
    to: VoteKind,
) -> Result<i32, AppError> {
    remove_in(txn, actor, target).await?;
    vote_repository::insert(txn, actor.user_id, target, to).await?;
    let rating = counters::shift_rating(txn, target, to.delta() - from.delta()).await?;

    tracing::info!(
        user_id = %actor.user_id,
        target = ?target,
        from = %from,
        to = %to,
        rating,
        "Vote changed"
    );
    Ok(rating)
}

fn duplicate(target: VoteTarget, kind: VoteKind) -> AppError {
    AppError::Conflict(format!(
        "You have already voted {} on this {}",
        kind,
        target.label().to_lowercase()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AnswerService;
    use crate::infrastructure::db::{testing, QuestionRepository, VoteRepository};
    use uuid::Uuid;

    struct Fixture {
        db: DatabaseConnection,
        votes: VoteService,
        question: Uuid,
        voters: Vec<Actor>,
    }

    async fn fixture(voters: usize) -> Fixture {
        let db = testing::memory_db().await;
        let author = testing::seed_user(&db, "author").await;
        let question = testing::seed_question(&db, author.id, "Q", 0).await;
        let mut actors = Vec::new();
        for i in 0..voters {
            let user = testing::seed_user(&db, &format!("voter{i}")).await;
            actors.push(Actor::new(user.id));
        }
        Fixture {
            votes: VoteService::new(db.clone()),
            db,
            question: question.id,
            voters: actors,
        }
    }

    async fn cached_rating(db: &DatabaseConnection, id: Uuid) -> i32 {
        QuestionRepository::new(db.clone())
            .find_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .rating
    }

    #[tokio::test]
    async fn test_three_likes_one_dislike_then_retract() {
        let f = fixture(4).await;
        let target = VoteTarget::Question(f.question);

        for actor in &f.voters[..3] {
            f.votes.cast(*actor, target, VoteKind::Like).await.unwrap();
        }
        let result = f.votes.cast(f.voters[3], target, VoteKind::Dislike).await.unwrap();
        assert_eq!(result.rating, 2);
        assert_eq!(cached_rating(&f.db, f.question).await, 2);

        let result = f.votes.retract(f.voters[0], target).await.unwrap();
        assert_eq!(result, VoteResult { vote: None, rating: 1 });
        assert_eq!(cached_rating(&f.db, f.question).await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_vote_is_rejected_and_not_counted() {
        let f = fixture(1).await;
        let target = VoteTarget::Question(f.question);
        let actor = f.voters[0];

        f.votes.cast(actor, target, VoteKind::Like).await.unwrap();
        let err = f.votes.cast(actor, target, VoteKind::Like).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = f.votes.cast(actor, target, VoteKind::Dislike).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let repo = VoteRepository::new(f.db.clone());
        assert_eq!(repo.count_rows(actor.user_id, target).await.unwrap(), 1);
        assert_eq!(cached_rating(&f.db, f.question).await, 1);
    }

    #[tokio::test]
    async fn test_vote_switches_with_net_delta_of_two() {
        let f = fixture(1).await;
        let target = VoteTarget::Question(f.question);
        let actor = f.voters[0];

        assert_eq!(f.votes.vote(actor, target, VoteKind::Like).await.unwrap().rating, 1);
        assert_eq!(f.votes.vote(actor, target, VoteKind::Dislike).await.unwrap().rating, -1);
        assert!(matches!(
            f.votes.vote(actor, target, VoteKind::Dislike).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(f.votes.change(actor, target, VoteKind::Like).await.unwrap().rating, 1);

        let repo = VoteRepository::new(f.db.clone());
        assert_eq!(repo.count_rows(actor.user_id, target).await.unwrap(), 1);
        assert_eq!(repo.find(actor.user_id, target).await.unwrap(), Some(VoteKind::Like));
    }

    #[tokio::test]
    async fn test_rating_matches_live_votes_for_mixed_sequence() {
        let f = fixture(5).await;
        let target = VoteTarget::Question(f.question);
        let v = &f.voters;

        f.votes.vote(v[0], target, VoteKind::Like).await.unwrap();
        f.votes.vote(v[1], target, VoteKind::Dislike).await.unwrap();
        f.votes.vote(v[2], target, VoteKind::Like).await.unwrap();
        f.votes.retract(v[1], target).await.unwrap();
        f.votes.vote(v[3], target, VoteKind::Dislike).await.unwrap();
        f.votes.vote(v[2], target, VoteKind::Dislike).await.unwrap();
        f.votes.vote(v[4], target, VoteKind::Like).await.unwrap();
        f.votes.retract(v[0], target).await.unwrap();
        let _ = f.votes.vote(v[4], target, VoteKind::Like).await;
        let _ = f.votes.retract(v[1], target).await;

        let repo = VoteRepository::new(f.db.clone());
        let live = repo.tally(target).await.unwrap();
        assert_eq!(live, -1);
        assert_eq!(cached_rating(&f.db, f.question).await, live);
    }

    #[tokio::test]
    async fn test_missing_target_and_missing_vote() {
        let f = fixture(1).await;
        let actor = f.voters[0];

        let err = f
            .votes
            .vote(actor, VoteTarget::Question(Uuid::new_v4()), VoteKind::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Question"));

        let err = f
            .votes
            .retract(actor, VoteTarget::Question(f.question))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Vote"));
        assert_eq!(cached_rating(&f.db, f.question).await, 0);
    }

    #[tokio::test]
    async fn test_vote_removed_by_another_request_is_not_counted_again() {
        let f = fixture(1).await;
        let target = VoteTarget::Question(f.question);
        let actor = f.voters[0];
        f.votes.cast(actor, target, VoteKind::Like).await.unwrap();

        let txn = f.db.begin().await.unwrap();
        assert_eq!(vote_repository::remove(&txn, actor.user_id, target).await.unwrap(), 1);
        counters::shift_rating(&txn, target, -1).await.unwrap();

        let err = retract_in(&txn, actor, target, VoteKind::Like).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Vote"));
        let err = switch_in(&txn, actor, target, VoteKind::Like, VoteKind::Dislike)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Vote"));
        assert_eq!(counters::current_rating(&txn, target).await.unwrap(), 0);
        txn.commit().await.unwrap();

        let repo = VoteRepository::new(f.db.clone());
        assert_eq!(repo.tally(target).await.unwrap(), 0);
        assert_eq!(cached_rating(&f.db, f.question).await, 0);
    }

    #[tokio::test]
    async fn test_answer_votes_update_answer_rating() {
        let f = fixture(2).await;
        let answers = AnswerService::new(f.db.clone());
        let posted = answers
            .post(f.voters[0], f.question, "An answer".to_string())
            .await
            .unwrap();
        let target = VoteTarget::Answer(posted.answer_id);

        f.votes.vote(f.voters[0], target, VoteKind::Like).await.unwrap();
        let result = f.votes.vote(f.voters[1], target, VoteKind::Like).await.unwrap();
        assert_eq!(result.rating, 2);

        let result = f.votes.vote(f.voters[1], target, VoteKind::Dislike).await.unwrap();
        assert_eq!(result.rating, 0);
        assert_eq!(cached_rating(&f.db, f.question).await, 0);
    }
}
