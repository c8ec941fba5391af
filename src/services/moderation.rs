use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::review::{NewReview, Review, ReviewFilter};
use crate::models::review_report::{NewReviewReport, ReviewReport};
use crate::store::EntityStore;

/// Column width of `reviews.comment` and `review_reports.reason`.
pub const MAX_TEXT_LEN: usize = 255;

fn validate_comment(comment: &str) -> Result<String> {
    let comment = comment.trim();

    if comment.is_empty() {
        return Err(AppError::Validation("Comment cannot be empty".to_string()));
    }
    if comment.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "Comment cannot exceed {} characters",
            MAX_TEXT_LEN
        )));
    }

    Ok(comment.to_string())
}

async fn find_review(store: &dyn EntityStore, review_id: Uuid) -> Result<Review> {
    store
        .find_review(review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
}

#[tracing::instrument(skip(store, comment))]
pub async fn create_review(
    store: &dyn EntityStore,
    movie_id: Uuid,
    user_id: Uuid,
    comment: &str,
) -> Result<Review> {
    let comment = validate_comment(comment)?;

    store
        .find_movie(movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    let review = store
        .insert_review(NewReview {
            movie_id,
            user_id,
            comment,
        })
        .await?;

    tracing::info!(review_id = %review.id, "Review created");

    Ok(review)
}

#[tracing::instrument(skip(store, new_comment))]
pub async fn edit_review(
    store: &dyn EntityStore,
    review_id: Uuid,
    user_id: Uuid,
    new_comment: &str,
) -> Result<Review> {
    let review = find_review(store, review_id).await?;

    if review.user_id != user_id {
        tracing::warn!(owner = %review.user_id, "Rejected edit of another user's review");
        return Err(AppError::Authorization(
            "Only the author can edit this review".to_string(),
        ));
    }

    let comment = validate_comment(new_comment)?;

    // The owner filter is repeated in the update itself; a miss here means
    // the review went away between the two calls.
    let review = store
        .update_review_comment(review_id, user_id, comment)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

    tracing::info!("Review edited");

    Ok(review)
}

#[tracing::instrument(skip(store))]
pub async fn delete_review(store: &dyn EntityStore, review_id: Uuid, user_id: Uuid) -> Result<()> {
    let review = find_review(store, review_id).await?;

    if review.user_id != user_id {
        tracing::warn!(owner = %review.user_id, "Rejected delete of another user's review");
        return Err(AppError::Authorization(
            "Only the author can delete this review".to_string(),
        ));
    }

    if !store.delete_review(review_id, user_id).await? {
        return Err(AppError::NotFound("Review not found".to_string()));
    }

    tracing::info!("Review deleted");

    Ok(())
}

/// Flags a review for `user_id`. Reporting twice returns the first report.
#[tracing::instrument(skip(store, reason))]
pub async fn report_review(
    store: &dyn EntityStore,
    review_id: Uuid,
    user_id: Uuid,
    reason: Option<String>,
) -> Result<ReviewReport> {
    find_review(store, review_id).await?;

    // A repeat report returns the first one as is, whatever reason it carries.
    if let Some(existing) = store.find_report(review_id, user_id).await? {
        tracing::debug!(report_id = %existing.id, "Review already reported by this user");
        return Ok(existing);
    }

    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    if let Some(ref r) = reason {
        if r.chars().count() > MAX_TEXT_LEN {
            return Err(AppError::Validation(format!(
                "Reason cannot exceed {} characters",
                MAX_TEXT_LEN
            )));
        }
    }

    let (report, created) = store
        .report_review(NewReviewReport {
            review_id,
            user_id,
            reason,
        })
        .await?;

    if created {
        tracing::info!(report_id = %report.id, "Review reported");
    } else {
        tracing::debug!(report_id = %report.id, "Review already reported by this user");
    }

    Ok(report)
}

/// Reviews for a movie, minus those the viewer has reported.
///
/// Anonymous viewers get every review.
pub async fn list_visible_reviews(
    store: &dyn EntityStore,
    movie_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Vec<Review>> {
    let filter = match viewer {
        Some(user_id) => ReviewFilter::HideReportedBy(user_id),
        None => ReviewFilter::All,
    };

    Ok(store.list_reviews(movie_id, filter).await?)
}

/// Reviews for a movie that nobody has reported.
pub async fn list_visible_reviews_strict(
    store: &dyn EntityStore,
    movie_id: Uuid,
) -> Result<Vec<Review>> {
    Ok(store
        .list_reviews(movie_id, ReviewFilter::HideAnyReported)
        .await?)
}

pub async fn list_reports(store: &dyn EntityStore, review_id: Uuid) -> Result<Vec<ReviewReport>> {
    find_review(store, review_id).await?;
    Ok(store.list_reports(review_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::movie::{Movie, NewMovie};
    use crate::store::MemoryStore;

    async fn seed_movie(store: &MemoryStore) -> Movie {
        store
            .insert_movie(NewMovie {
                name: "Paprika".to_string(),
                price: 8,
                description: "Dream detective".to_string(),
                image: String::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_review_rejects_empty_comment() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;

        for comment in ["", "   "] {
            let err = create_review(&store, movie.id, Uuid::new_v4(), comment)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(list_visible_reviews(&store, movie.id, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_review_rejects_overlong_comment() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;

        let comment = "x".repeat(MAX_TEXT_LEN + 1);
        let err = create_review(&store, movie.id, Uuid::new_v4(), &comment)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_review_for_missing_movie() {
        let store = MemoryStore::new();
        let err = create_review(&store, Uuid::new_v4(), Uuid::new_v4(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_edit_review_by_owner() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let author = Uuid::new_v4();
        let review = create_review(&store, movie.id, author, "first take")
            .await
            .unwrap();

        let edited = edit_review(&store, review.id, author, "second take")
            .await
            .unwrap();
        assert_eq!(edited.id, review.id);
        assert_eq!(edited.comment, "second take");
        assert_eq!(edited.created_at, review.created_at);
    }

    #[tokio::test]
    async fn test_edit_and_delete_by_other_user_are_rejected() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let author = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let review = create_review(&store, movie.id, author, "first draft")
            .await
            .unwrap();

        let err = edit_review(&store, review.id, intruder, "defaced")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let err = delete_review(&store, review.id, intruder).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let unchanged = store.find_review(review.id).await.unwrap().unwrap();
        assert_eq!(unchanged, review);
    }

    #[tokio::test]
    async fn test_edit_missing_review() {
        let store = MemoryStore::new();
        let err = edit_review(&store, Uuid::new_v4(), Uuid::new_v4(), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_edit_with_empty_comment_keeps_review() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let author = Uuid::new_v4();
        let review = create_review(&store, movie.id, author, "keep me")
            .await
            .unwrap();

        let err = edit_review(&store, review.id, author, "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(
            store.find_review(review.id).await.unwrap().unwrap().comment,
            "keep me"
        );
    }

    #[tokio::test]
    async fn test_delete_review_by_owner() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let author = Uuid::new_v4();
        let review = create_review(&store, movie.id, author, "bye").await.unwrap();

        delete_review(&store, review.id, author).await.unwrap();
        assert!(store.find_review(review.id).await.unwrap().is_none());

        let err = delete_review(&store, review.id, author).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_double_report_hides_review_only_for_reporter() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let review = create_review(&store, movie.id, Uuid::new_v4(), "offensive")
            .await
            .unwrap();
        let other_review = create_review(&store, movie.id, Uuid::new_v4(), "fine")
            .await
            .unwrap();
        let reporter = Uuid::new_v4();
        let bystander = Uuid::new_v4();

        let first = report_review(&store, review.id, reporter, Some("rude".to_string()))
            .await
            .unwrap();
        let second = report_review(&store, review.id, reporter, None)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(list_reports(&store, review.id).await.unwrap().len(), 1);

        let seen_by_reporter = list_visible_reviews(&store, movie.id, Some(reporter))
            .await
            .unwrap();
        assert_eq!(seen_by_reporter, vec![other_review.clone()]);

        let seen_by_bystander = list_visible_reviews(&store, movie.id, Some(bystander))
            .await
            .unwrap();
        assert_eq!(seen_by_bystander, vec![review.clone(), other_review.clone()]);

        let anonymous = list_visible_reviews(&store, movie.id, None).await.unwrap();
        assert_eq!(anonymous.len(), 2);

        let strict = list_visible_reviews_strict(&store, movie.id).await.unwrap();
        assert_eq!(strict, vec![other_review]);
    }

    #[tokio::test]
    async fn test_report_blank_reason_is_stored_empty() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let review = create_review(&store, movie.id, Uuid::new_v4(), "meh")
            .await
            .unwrap();

        let report = report_review(&store, review.id, Uuid::new_v4(), Some("  ".to_string()))
            .await
            .unwrap();
        assert_eq!(report.reason, "");
    }

    #[tokio::test]
    async fn test_repeat_report_ignores_overlong_reason() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let review = create_review(&store, movie.id, Uuid::new_v4(), "loud")
            .await
            .unwrap();
        let reporter = Uuid::new_v4();

        let first = report_review(&store, review.id, reporter, Some("spam".to_string()))
            .await
            .unwrap();
        let second = report_review(
            &store,
            review.id,
            reporter,
            Some("x".repeat(MAX_TEXT_LEN + 45)),
        )
        .await
        .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.reason, "spam");
    }

    #[tokio::test]
    async fn test_first_report_rejects_overlong_reason() {
        let store = MemoryStore::new();
        let movie = seed_movie(&store).await;
        let review = create_review(&store, movie.id, Uuid::new_v4(), "loud")
            .await
            .unwrap();

        let err = report_review(
            &store,
            review.id,
            Uuid::new_v4(),
            Some("x".repeat(MAX_TEXT_LEN + 1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_reports(&store, review.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_missing_review() {
        let store = MemoryStore::new();
        let err = report_review(&store, Uuid::new_v4(), Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
