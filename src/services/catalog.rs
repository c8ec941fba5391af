use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::movie::{Movie, NewMovie};
use crate::models::review::Review;
use crate::services::moderation;
use crate::store::EntityStore;

/// Column width of `movies.name`.
pub const MAX_NAME_LEN: usize = 255;

/// A movie together with the reviews its viewer gets to see.
#[derive(Debug, Serialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub reviews: Vec<Review>,
}

#[tracing::instrument(skip(store, data), fields(name = %data.name))]
pub async fn create_movie(store: &dyn EntityStore, mut data: NewMovie) -> Result<Movie> {
    data.name = data.name.trim().to_string();
    data.description = data.description.trim().to_string();

    if data.name.is_empty() {
        return Err(AppError::Validation("Movie name is required".to_string()));
    }
    if data.name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Movie name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    if data.description.is_empty() {
        return Err(AppError::Validation(
            "Movie description is required".to_string(),
        ));
    }
    if data.price < 0 {
        return Err(AppError::Validation(
            "Movie price cannot be negative".to_string(),
        ));
    }

    let movie = store.insert_movie(data).await?;
    tracing::info!(movie_id = %movie.id, "Movie created");

    Ok(movie)
}

pub async fn list_movies(store: &dyn EntityStore) -> Result<Vec<Movie>> {
    Ok(store.list_movies().await?)
}

pub async fn get_movie(store: &dyn EntityStore, movie_id: Uuid) -> Result<Movie> {
    store
        .find_movie(movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
}

pub async fn movie_detail(
    store: &dyn EntityStore,
    movie_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<MovieDetail> {
    let movie = get_movie(store, movie_id).await?;
    let reviews = moderation::list_visible_reviews(store, movie_id, viewer).await?;

    Ok(MovieDetail { movie, reviews })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn new_movie(name: &str) -> NewMovie {
        NewMovie {
            name: name.to_string(),
            price: 10,
            description: "A film".to_string(),
            image: "movie_images/poster.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_movie_trims_and_validates() {
        let store = MemoryStore::new();

        let movie = create_movie(&store, new_movie("  Alien ")).await.unwrap();
        assert_eq!(movie.name, "Alien");

        let err = create_movie(&store, new_movie("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut negative = new_movie("Cheap");
        negative.price = -1;
        let err = create_movie(&store, negative).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_movie_caps_name_length() {
        let store = MemoryStore::new();

        let err = create_movie(&store, new_movie(&"a".repeat(MAX_NAME_LEN + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(list_movies(&store).await.unwrap().is_empty());

        let movie = create_movie(&store, new_movie(&"é".repeat(MAX_NAME_LEN)))
            .await
            .unwrap();
        assert_eq!(movie.name.chars().count(), MAX_NAME_LEN);
    }

    #[tokio::test]
    async fn test_list_movies_sorted_by_name() {
        let store = MemoryStore::new();
        create_movie(&store, new_movie("Zodiac")).await.unwrap();
        create_movie(&store, new_movie("Amelie")).await.unwrap();

        let names: Vec<String> = list_movies(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Amelie", "Zodiac"]);
    }

    #[tokio::test]
    async fn test_get_missing_movie() {
        let store = MemoryStore::new();
        let err = get_movie(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
