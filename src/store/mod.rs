//! Repository abstraction over the entity tables.
//!
//! Services only ever reach persistent state through `EntityStore`. Two
//! backends exist: `PgStore` for PostgreSQL and `MemoryStore`, which keeps
//! everything in process and is lost on restart.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    movie::{Movie, NewMovie},
    petition::{NewPetition, Petition, TallyAudit},
    review::{NewReview, Review, ReviewFilter},
    review_report::{NewReviewReport, ReviewReport},
    vote::{Vote, VoteTransition, VoteType},
};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Integrity violation: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a committed `cast_vote`.
#[derive(Debug, Clone)]
pub struct CastVote {
    /// Petition as of the commit, counters included.
    pub petition: Petition,
    pub vote: Vote,
    pub transition: VoteTransition,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Cheap round trip to check the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_movie(&self, data: NewMovie) -> StoreResult<Movie>;
    async fn find_movie(&self, id: Uuid) -> StoreResult<Option<Movie>>;
    /// All movies, by name.
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;

    async fn insert_review(&self, data: NewReview) -> StoreResult<Review>;
    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>>;
    /// Rewrites the comment if the review exists and belongs to `user_id`.
    async fn update_review_comment(
        &self,
        id: Uuid,
        user_id: Uuid,
        comment: String,
    ) -> StoreResult<Option<Review>>;
    /// Deletes the review and its reports if it belongs to `user_id`.
    async fn delete_review(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    /// Reviews of a movie in creation order, minus whatever `filter` hides.
    async fn list_reviews(&self, movie_id: Uuid, filter: ReviewFilter)
        -> StoreResult<Vec<Review>>;

    /// Records a report, or returns the existing one for the same (review, user).
    ///
    /// The flag is `true` when a new row was written.
    async fn report_review(&self, data: NewReviewReport) -> StoreResult<(ReviewReport, bool)>;
    async fn find_report(&self, review_id: Uuid, user_id: Uuid)
        -> StoreResult<Option<ReviewReport>>;
    async fn list_reports(&self, review_id: Uuid) -> StoreResult<Vec<ReviewReport>>;

    async fn insert_petition(&self, data: NewPetition) -> StoreResult<Petition>;
    async fn find_petition(&self, id: Uuid) -> StoreResult<Option<Petition>>;
    /// All petitions, newest first.
    async fn list_petitions(&self) -> StoreResult<Vec<Petition>>;
    /// Deletes the petition and its votes.
    async fn delete_petition(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_vote(&self, petition_id: Uuid, user_id: Uuid) -> StoreResult<Option<Vote>>;
    async fn count_votes(&self, petition_id: Uuid) -> StoreResult<i64>;
    /// Counters and vote row count of one petition, taken together so that no
    /// concurrent cast lands between the two reads.
    async fn tally(&self, petition_id: Uuid) -> StoreResult<Option<TallyAudit>>;

    /// Casts `vote_type` for `user_id` on a petition.
    ///
    /// The prior vote lookup, the vote row write and both counter updates
    /// happen as one unit serialized per petition. Returns `None` when the
    /// petition does not exist.
    async fn cast_vote(
        &self,
        petition_id: Uuid,
        user_id: Uuid,
        vote_type: VoteType,
    ) -> StoreResult<Option<CastVote>>;
}
