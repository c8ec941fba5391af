use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A user's flag on a review. At most one per (review, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReviewReport {
    pub id: Uuid,
    pub review_id: Uuid,
    pub user_id: Uuid,
    pub reason: String, // empty when the reporter gave none
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReviewReport {
    pub review_id: Uuid,
    pub user_id: Uuid,
    pub reason: Option<String>,
}

impl ReviewReport {
    /// Inserts the report unless one already exists for the pair.
    ///
    /// Returns `None` on conflict; the existing row is left untouched.
    pub async fn insert_if_absent<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewReviewReport,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO review_reports (review_id, user_id, reason)
            VALUES ($1, $2, $3)
            ON CONFLICT (review_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(data.review_id)
        .bind(data.user_id)
        .bind(data.reason.as_deref().unwrap_or_default())
        .fetch_optional(executor)
        .await
    }

    /// Finds the report a user filed against a review
    pub async fn find_by_review_and_user<'e, E: PgExecutor<'e>>(
        executor: E,
        review_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM review_reports WHERE review_id = $1 AND user_id = $2",
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Lists all reports filed against a review
    pub async fn list_by_review<'e, E: PgExecutor<'e>>(
        executor: E,
        review_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM review_reports
            WHERE review_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(review_id)
        .fetch_all(executor)
        .await
    }
}
