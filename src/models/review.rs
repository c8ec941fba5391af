use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub movie_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub movie_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
}

/// Which reported reviews a listing leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFilter {
    All,
    /// Hide reviews this user has reported.
    HideReportedBy(Uuid),
    /// Hide reviews reported by anyone.
    HideAnyReported,
}

impl Review {
    /// Creates a new review record
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewReview,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO reviews (movie_id, user_id, comment)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.movie_id)
        .bind(data.user_id)
        .bind(&data.comment)
        .fetch_one(executor)
        .await
    }

    /// Finds a review by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Rewrites the comment of a review owned by `user_id`.
    ///
    /// Returns `None` when no review with that id belongs to the user.
    pub async fn update_comment<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
        comment: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE reviews
            SET comment = $3
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(comment)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a review owned by `user_id`. Reports go with it (ON DELETE CASCADE).
    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a movie's reviews oldest first, leaving out what `filter` hides
    pub async fn list_for_movie<'e, E: PgExecutor<'e>>(
        executor: E,
        movie_id: Uuid,
        filter: ReviewFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match filter {
            ReviewFilter::All => {
                sqlx::query_as::<_, Self>(
                    r#"
                    SELECT * FROM reviews
                    WHERE movie_id = $1
                    ORDER BY created_at ASC, id ASC
                    "#,
                )
                .bind(movie_id)
                .fetch_all(executor)
                .await
            }
            ReviewFilter::HideReportedBy(viewer) => {
                sqlx::query_as::<_, Self>(
                    r#"
                    SELECT r.* FROM reviews r
                    WHERE r.movie_id = $1
                      AND NOT EXISTS (
                          SELECT 1 FROM review_reports rr
                          WHERE rr.review_id = r.id AND rr.user_id = $2
                      )
                    ORDER BY r.created_at ASC, r.id ASC
                    "#,
                )
                .bind(movie_id)
                .bind(viewer)
                .fetch_all(executor)
                .await
            }
            ReviewFilter::HideAnyReported => {
                sqlx::query_as::<_, Self>(
                    r#"
                    SELECT r.* FROM reviews r
                    WHERE r.movie_id = $1
                      AND NOT EXISTS (
                          SELECT 1 FROM review_reports rr WHERE rr.review_id = r.id
                      )
                    ORDER BY r.created_at ASC, r.id ASC
                    "#,
                )
                .bind(movie_id)
                .fetch_all(executor)
                .await
            }
        }
    }
}
