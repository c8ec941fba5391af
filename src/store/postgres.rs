//! PostgreSQL implementation of `EntityStore`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CastVote, EntityStore, StoreError, StoreResult};
use crate::models::{
    movie::{Movie, NewMovie},
    petition::{NewPetition, Petition, TallyAudit},
    review::{NewReview, Review, ReviewFilter},
    review_report::{NewReviewReport, ReviewReport},
    vote::{Vote, VoteTransition, VoteType},
};

/// Postgres-backed store.
///
/// Uniqueness and cascades are enforced by the schema; `cast_vote` holds the
/// petition row lock for the duration of its transaction, so casts on the
/// same petition are strictly ordered while other petitions proceed.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn insert_movie(&self, data: NewMovie) -> StoreResult<Movie> {
        Ok(Movie::create(&self.pool, &data).await?)
    }

    async fn find_movie(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        Ok(Movie::find_by_id(&self.pool, id).await?)
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        Ok(Movie::list_all(&self.pool).await?)
    }

    async fn insert_review(&self, data: NewReview) -> StoreResult<Review> {
        Ok(Review::create(&self.pool, &data).await?)
    }

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(Review::find_by_id(&self.pool, id).await?)
    }

    async fn update_review_comment(
        &self,
        id: Uuid,
        user_id: Uuid,
        comment: String,
    ) -> StoreResult<Option<Review>> {
        Ok(Review::update_comment(&self.pool, id, user_id, &comment).await?)
    }

    async fn delete_review(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Review::delete(&self.pool, id, user_id).await?)
    }

    async fn list_reviews(
        &self,
        movie_id: Uuid,
        filter: ReviewFilter,
    ) -> StoreResult<Vec<Review>> {
        Ok(Review::list_for_movie(&self.pool, movie_id, filter).await?)
    }

    async fn report_review(&self, data: NewReviewReport) -> StoreResult<(ReviewReport, bool)> {
        if let Some(created) = ReviewReport::insert_if_absent(&self.pool, &data).await? {
            return Ok((created, true));
        }

        // Lost the insert to an existing row; it cannot disappear short of the
        // review itself being deleted in between.
        let existing =
            ReviewReport::find_by_review_and_user(&self.pool, data.review_id, data.user_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;

        Ok((existing, false))
    }

    async fn find_report(
        &self,
        review_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ReviewReport>> {
        Ok(ReviewReport::find_by_review_and_user(&self.pool, review_id, user_id).await?)
    }

    async fn list_reports(&self, review_id: Uuid) -> StoreResult<Vec<ReviewReport>> {
        Ok(ReviewReport::list_by_review(&self.pool, review_id).await?)
    }

    async fn insert_petition(&self, data: NewPetition) -> StoreResult<Petition> {
        Ok(Petition::create(&self.pool, &data).await?)
    }

    async fn find_petition(&self, id: Uuid) -> StoreResult<Option<Petition>> {
        Ok(Petition::find_by_id(&self.pool, id).await?)
    }

    async fn list_petitions(&self) -> StoreResult<Vec<Petition>> {
        Ok(Petition::list_newest_first(&self.pool).await?)
    }

    async fn delete_petition(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Petition::delete(&self.pool, id).await?)
    }

    async fn find_vote(&self, petition_id: Uuid, user_id: Uuid) -> StoreResult<Option<Vote>> {
        Ok(Vote::find_by_petition_and_user(&self.pool, petition_id, user_id).await?)
    }

    async fn count_votes(&self, petition_id: Uuid) -> StoreResult<i64> {
        Ok(Vote::count_for_petition(&self.pool, petition_id).await?)
    }

    async fn tally(&self, petition_id: Uuid) -> StoreResult<Option<TallyAudit>> {
        Ok(Petition::tally(&self.pool, petition_id).await?)
    }

    async fn cast_vote(
        &self,
        petition_id: Uuid,
        user_id: Uuid,
        vote_type: VoteType,
    ) -> StoreResult<Option<CastVote>> {
        let mut tx = self.pool.begin().await?;

        let Some(petition) = Petition::lock_by_id(&mut *tx, petition_id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let prior = Vote::find_by_petition_and_user(&mut *tx, petition_id, user_id).await?;
        let transition = VoteTransition::plan(prior.as_ref().map(|v| v.vote_type), vote_type);

        let (vote, petition) = match (prior, transition) {
            (Some(existing), VoteTransition::Unchanged { .. }) => (existing, petition),
            (Some(existing), VoteTransition::Changed { to, .. }) => {
                let vote = Vote::set_type(&mut *tx, existing.id, to).await?;
                let (yes, no) = transition.deltas();
                let petition = Petition::adjust_counters(&mut *tx, petition_id, yes, no).await?;
                (vote, petition)
            }
            (None, VoteTransition::Recorded { vote_type }) => {
                let vote = Vote::create(&mut *tx, petition_id, user_id, vote_type).await?;
                let (yes, no) = transition.deltas();
                let petition = Petition::adjust_counters(&mut *tx, petition_id, yes, no).await?;
                (vote, petition)
            }
            (prior, transition) => {
                tx.rollback().await?;
                return Err(StoreError::Integrity(format!(
                    "transition {:?} does not apply to prior vote {:?}",
                    transition,
                    prior.map(|v| v.vote_type)
                )));
            }
        };

        tx.commit().await?;

        Ok(Some(CastVote {
            petition,
            vote,
            transition,
        }))
    }
}
