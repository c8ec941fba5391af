//! In-memory implementation of `EntityStore`.
//!
//! Movies, reviews and reports share one `RwLock`. Each petition lives in its
//! own slot behind a `Mutex` holding the petition and its votes, so a cast
//! only ever waits on casts to the same petition. Compound operations run
//! under a single guard with no awaits in between, so readers see either the
//! state before or after them. Everything is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{CastVote, EntityStore, StoreError, StoreResult};
use crate::models::{
    movie::{Movie, NewMovie},
    petition::{NewPetition, Petition, TallyAudit},
    review::{NewReview, Review, ReviewFilter},
    review_report::{NewReviewReport, ReviewReport},
    vote::{Vote, VoteTransition, VoteType},
};

#[derive(Default)]
struct Catalog {
    // Vec keeps insertion order, which is the listing order for reviews.
    movies: Vec<Movie>,
    reviews: Vec<Review>,
    reports: Vec<ReviewReport>,
}

impl Catalog {
    fn is_reported(&self, review_id: Uuid, by: Option<Uuid>) -> bool {
        self.reports
            .iter()
            .any(|r| r.review_id == review_id && by.map_or(true, |user| r.user_id == user))
    }
}

/// A petition together with its votes.
struct PetitionSlot {
    /// Insertion sequence, breaks ties between equal `created_at`.
    seq: u64,
    petition: Petition,
    votes: Vec<Vote>,
}

impl PetitionSlot {
    fn tally(&self) -> TallyAudit {
        TallyAudit {
            yes_votes: self.petition.yes_votes,
            no_votes: self.petition.no_votes,
            vote_rows: self.votes.len() as i64,
        }
    }
}

#[derive(Default)]
struct PetitionIndex {
    next_seq: u64,
    slots: HashMap<Uuid, Arc<Mutex<PetitionSlot>>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    catalog: Arc<RwLock<Catalog>>,
    petitions: Arc<RwLock<PetitionIndex>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index guard is released before the caller locks the slot.
    async fn slot(&self, petition_id: Uuid) -> Option<Arc<Mutex<PetitionSlot>>> {
        self.petitions.read().await.slots.get(&petition_id).cloned()
    }
}

fn apply_delta(counter: i32, delta: i32, name: &str) -> StoreResult<i32> {
    match counter.checked_add(delta) {
        Some(value) if value >= 0 => Ok(value),
        _ => Err(StoreError::Integrity(format!(
            "{} counter would leave range: {} {:+}",
            name, counter, delta
        ))),
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        let _catalog = self.catalog.read().await;
        Ok(())
    }

    async fn insert_movie(&self, data: NewMovie) -> StoreResult<Movie> {
        let movie = Movie {
            id: Uuid::new_v4(),
            name: data.name,
            price: data.price,
            description: data.description,
            image: data.image,
            created_at: Utc::now(),
        };

        self.catalog.write().await.movies.push(movie.clone());
        Ok(movie)
    }

    async fn find_movie(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.movies.iter().find(|m| m.id == id).cloned())
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let catalog = self.catalog.read().await;
        let mut movies = catalog.movies.clone();
        movies.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(movies)
    }

    async fn insert_review(&self, data: NewReview) -> StoreResult<Review> {
        let mut catalog = self.catalog.write().await;

        if !catalog.movies.iter().any(|m| m.id == data.movie_id) {
            return Err(StoreError::Integrity(format!(
                "review references missing movie {}",
                data.movie_id
            )));
        }

        let review = Review {
            id: Uuid::new_v4(),
            comment: data.comment,
            created_at: Utc::now(),
            movie_id: data.movie_id,
            user_id: data.user_id,
        };

        catalog.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn update_review_comment(
        &self,
        id: Uuid,
        user_id: Uuid,
        comment: String,
    ) -> StoreResult<Option<Review>> {
        let mut catalog = self.catalog.write().await;

        Ok(catalog
            .reviews
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .map(|review| {
                review.comment = comment;
                review.clone()
            }))
    }

    async fn delete_review(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut catalog = self.catalog.write().await;

        let before = catalog.reviews.len();
        catalog
            .reviews
            .retain(|r| !(r.id == id && r.user_id == user_id));
        let deleted = catalog.reviews.len() < before;

        if deleted {
            catalog.reports.retain(|r| r.review_id != id);
        }

        Ok(deleted)
    }

    async fn list_reviews(
        &self,
        movie_id: Uuid,
        filter: ReviewFilter,
    ) -> StoreResult<Vec<Review>> {
        let catalog = self.catalog.read().await;

        Ok(catalog
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .filter(|r| match filter {
                ReviewFilter::All => true,
                ReviewFilter::HideReportedBy(viewer) => !catalog.is_reported(r.id, Some(viewer)),
                ReviewFilter::HideAnyReported => !catalog.is_reported(r.id, None),
            })
            .cloned()
            .collect())
    }

    async fn report_review(&self, data: NewReviewReport) -> StoreResult<(ReviewReport, bool)> {
        let mut catalog = self.catalog.write().await;

        if let Some(existing) = catalog
            .reports
            .iter()
            .find(|r| r.review_id == data.review_id && r.user_id == data.user_id)
        {
            return Ok((existing.clone(), false));
        }

        if !catalog.reviews.iter().any(|r| r.id == data.review_id) {
            return Err(StoreError::Integrity(format!(
                "report references missing review {}",
                data.review_id
            )));
        }

        let report = ReviewReport {
            id: Uuid::new_v4(),
            review_id: data.review_id,
            user_id: data.user_id,
            reason: data.reason.unwrap_or_default(),
            created_at: Utc::now(),
        };

        catalog.reports.push(report.clone());
        Ok((report, true))
    }

    async fn list_reports(&self, review_id: Uuid) -> StoreResult<Vec<ReviewReport>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .reports
            .iter()
            .filter(|r| r.review_id == review_id)
            .cloned()
            .collect())
    }

    async fn find_report(
        &self,
        review_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ReviewReport>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .reports
            .iter()
            .find(|r| r.review_id == review_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_petition(&self, data: NewPetition) -> StoreResult<Petition> {
        let petition = Petition {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            movie_title: data.movie_title,
            created_by: data.created_by,
            created_at: Utc::now(),
            yes_votes: 0,
            no_votes: 0,
        };

        let mut index = self.petitions.write().await;
        let seq = index.next_seq;
        index.next_seq += 1;
        index.slots.insert(
            petition.id,
            Arc::new(Mutex::new(PetitionSlot {
                seq,
                petition: petition.clone(),
                votes: Vec::new(),
            })),
        );

        Ok(petition)
    }

    async fn find_petition(&self, id: Uuid) -> StoreResult<Option<Petition>> {
        let Some(slot) = self.slot(id).await else {
            return Ok(None);
        };
        let petition = slot.lock().await.petition.clone();
        Ok(Some(petition))
    }

    async fn list_petitions(&self) -> StoreResult<Vec<Petition>> {
        let slots: Vec<_> = self.petitions.read().await.slots.values().cloned().collect();

        let mut rows = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.lock().await;
            rows.push((slot.seq, slot.petition.clone()));
        }

        rows.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });
        Ok(rows.into_iter().map(|(_, petition)| petition).collect())
    }

    async fn delete_petition(&self, id: Uuid) -> StoreResult<bool> {
        // Dropping the slot drops its votes with it.
        Ok(self.petitions.write().await.slots.remove(&id).is_some())
    }

    async fn find_vote(&self, petition_id: Uuid, user_id: Uuid) -> StoreResult<Option<Vote>> {
        let Some(slot) = self.slot(petition_id).await else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok(slot.votes.iter().find(|v| v.user_id == user_id).cloned())
    }

    async fn count_votes(&self, petition_id: Uuid) -> StoreResult<i64> {
        let Some(slot) = self.slot(petition_id).await else {
            return Ok(0);
        };
        let count = slot.lock().await.votes.len() as i64;
        Ok(count)
    }

    async fn tally(&self, petition_id: Uuid) -> StoreResult<Option<TallyAudit>> {
        let Some(slot) = self.slot(petition_id).await else {
            return Ok(None);
        };
        let tally = slot.lock().await.tally();
        Ok(Some(tally))
    }

    async fn cast_vote(
        &self,
        petition_id: Uuid,
        user_id: Uuid,
        vote_type: VoteType,
    ) -> StoreResult<Option<CastVote>> {
        let Some(slot) = self.slot(petition_id).await else {
            return Ok(None);
        };
        let mut guard = slot.lock().await;
        let slot = &mut *guard;

        let prior_idx = slot.votes.iter().position(|v| v.user_id == user_id);
        let transition =
            VoteTransition::plan(prior_idx.map(|i| slot.votes[i].vote_type), vote_type);

        // Compute the new counters before touching anything so a failure
        // leaves the slot as it was.
        let (yes_delta, no_delta) = transition.deltas();
        let yes_votes = apply_delta(slot.petition.yes_votes, yes_delta, "yes")?;
        let no_votes = apply_delta(slot.petition.no_votes, no_delta, "no")?;

        let vote = match prior_idx {
            Some(i) => {
                slot.votes[i].vote_type = transition.resulting_type();
                slot.votes[i].clone()
            }
            None => {
                let vote = Vote {
                    id: Uuid::new_v4(),
                    petition_id,
                    user_id,
                    vote_type,
                    created_at: Utc::now(),
                };
                slot.votes.push(vote.clone());
                vote
            }
        };

        slot.petition.yes_votes = yes_votes;
        slot.petition.no_votes = no_votes;

        Ok(Some(CastVote {
            petition: slot.petition.clone(),
            vote,
            transition,
        }))
    }
}
