use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::auth::{ActingUser, MaybeActingUser};
use crate::api::AppState;
use crate::error::Result;
use crate::models::movie::{Movie, NewMovie};
use crate::models::review::Review;
use crate::services::{catalog, moderation};

#[derive(Debug, Deserialize)]
pub struct ListReviewsQuery {
    /// Hide reviews reported by anyone, not just by the caller.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub comment: String,
}

async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<Movie>>> {
    let movies = catalog::list_movies(state.store.as_ref()).await?;
    Ok(Json(movies))
}

async fn create_movie(
    State(state): State<AppState>,
    _user: ActingUser,
    Json(req): Json<NewMovie>,
) -> Result<(StatusCode, Json<Movie>)> {
    let movie = catalog::create_movie(state.store.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn show_movie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeActingUser(viewer): MaybeActingUser,
) -> Result<Json<catalog::MovieDetail>> {
    let detail = catalog::movie_detail(state.store.as_ref(), id, viewer).await?;
    Ok(Json(detail))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListReviewsQuery>,
    MaybeActingUser(viewer): MaybeActingUser,
) -> Result<Json<Vec<Review>>> {
    let store = state.store.as_ref();
    catalog::get_movie(store, id).await?;

    let reviews = if params.strict {
        moderation::list_visible_reviews_strict(store, id).await?
    } else {
        moderation::list_visible_reviews(store, id, viewer).await?
    };

    Ok(Json(reviews))
}

async fn create_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: ActingUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let review =
        moderation::create_review(state.store.as_ref(), id, user.user_id, &req.comment).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/movies", get(list_movies).post(create_movie))
        .route("/api/movies/:id", get(show_movie))
        .route(
            "/api/movies/:id/reviews",
            get(list_reviews).post(create_review),
        )
}
