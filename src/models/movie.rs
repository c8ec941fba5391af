use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub name: String,
    pub price: i32,
    pub description: String,
    pub image: String, // path or URL, upload handling lives elsewhere
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub name: String,
    pub price: i32,
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl Movie {
    /// Creates a new movie record
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &NewMovie,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO movies (name, price, description, image)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(data.price)
        .bind(&data.description)
        .bind(&data.image)
        .fetch_one(executor)
        .await
    }

    /// Finds a movie by ID
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists all movies ordered by name
    pub async fn list_all<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM movies ORDER BY name ASC, id ASC")
            .fetch_all(executor)
            .await
    }
}
