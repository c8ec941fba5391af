use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A request for a movie to be added to the catalogue.
///
/// `yes_votes` and `no_votes` summarize the petition's vote rows and are only
/// ever changed in the same transaction as those rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Petition {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub movie_title: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub yes_votes: i32,
    pub no_votes: i32,
}

/// Stored counters next to the number of vote rows they summarize, read as
/// one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct TallyAudit {
    pub yes_votes: i32,
    pub no_votes: i32,
    pub vote_rows: i64,
}

impl TallyAudit {
    pub fn is_consistent(&self) -> bool {
        self.yes_votes >= 0
            && self.no_votes >= 0
            && i64::from(self.yes_votes) + i64::from(self.no_votes) == self.vote_rows
    }
}

#[derive(Debug, Clone)]
pub struct NewPetition {
    pub title: String,
    pub description: String,
    pub movie_title: String,
    pub created_by: Uuid,
}

impl Petition {
    pub fn total_votes(&self) -> i64 {
        i64::from(self.yes_votes) + i64::from(self.no_votes)
    }

    /// Creates a petition with both counters at zero
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewPetition,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO petitions (title, description, movie_title, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.movie_title)
        .bind(data.created_by)
        .fetch_one(executor)
        .await
    }

    /// Finds a petition by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM petitions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Loads the petition and takes its row lock for the rest of the transaction.
    pub async fn lock_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM petitions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists all petitions, newest first
    pub async fn list_newest_first<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM petitions ORDER BY created_at DESC, id DESC")
            .fetch_all(executor)
            .await
    }

    /// Reads the counters and the vote row count in a single statement, so
    /// both come from the same snapshot.
    pub async fn tally<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<TallyAudit>, sqlx::Error> {
        sqlx::query_as::<_, TallyAudit>(
            r#"
            SELECT p.yes_votes,
                   p.no_votes,
                   (SELECT COUNT(*) FROM votes v WHERE v.petition_id = p.id) AS vote_rows
            FROM petitions p
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Applies both counter deltas in one statement.
    pub async fn adjust_counters<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        yes_delta: i32,
        no_delta: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE petitions
            SET yes_votes = yes_votes + $2,
                no_votes = no_votes + $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(yes_delta)
        .bind(no_delta)
        .fetch_one(executor)
        .await
    }

    /// Deletes the petition. Votes go with it (ON DELETE CASCADE).
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM petitions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
