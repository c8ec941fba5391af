use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::auth::{ActingUser, MaybeActingUser};
use crate::api::AppState;
use crate::error::Result;
use crate::models::petition::Petition;
use crate::models::vote::Vote;
use crate::services::voting;

#[derive(Debug, Deserialize)]
pub struct CreatePetitionRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub movie_title: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub vote_type: String,
}

#[derive(Debug, Serialize)]
pub struct UserVoteResponse {
    pub vote: Option<Vote>,
}

async fn list_petitions(State(state): State<AppState>) -> Result<Json<Vec<Petition>>> {
    let petitions = voting::list_petitions(state.store.as_ref()).await?;
    Ok(Json(petitions))
}

async fn create_petition(
    State(state): State<AppState>,
    user: ActingUser,
    Json(req): Json<CreatePetitionRequest>,
) -> Result<(StatusCode, Json<Petition>)> {
    let petition = voting::create_petition(
        state.store.as_ref(),
        user.user_id,
        &req.title,
        &req.description,
        &req.movie_title,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(petition)))
}

async fn show_petition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeActingUser(viewer): MaybeActingUser,
) -> Result<Json<voting::PetitionDetail>> {
    let detail = voting::petition_detail(state.store.as_ref(), id, viewer).await?;
    Ok(Json(detail))
}

async fn delete_petition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: ActingUser,
) -> Result<StatusCode> {
    voting::delete_petition(state.store.as_ref(), id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: ActingUser,
    Json(req): Json<VoteRequest>,
) -> Result<Json<voting::VoteReceipt>> {
    let receipt =
        voting::cast_vote(state.store.as_ref(), id, user.user_id, &req.vote_type).await?;
    Ok(Json(receipt))
}

async fn get_user_vote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: ActingUser,
) -> Result<Json<UserVoteResponse>> {
    let store = state.store.as_ref();
    voting::get_petition(store, id).await?;

    let vote = voting::get_user_vote(store, id, user.user_id).await?;
    Ok(Json(UserVoteResponse { vote }))
}

async fn tally(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<voting::TallyAudit>> {
    let audit = voting::audit_tally(state.store.as_ref(), id).await?;
    Ok(Json(audit))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/petitions", get(list_petitions).post(create_petition))
        .route(
            "/api/petitions/:id",
            get(show_petition).delete(delete_petition),
        )
        .route(
            "/api/petitions/:id/vote",
            get(get_user_vote).post(cast_vote),
        )
        .route("/api/petitions/:id/tally", get(tally))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{send, test_app};
    use axum::{http::StatusCode, Router};
    use serde_json::{json, Value};
    use uuid::Uuid;

    async fn vote(app: &Router, petition: &str, user: Uuid, vote_type: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            &format!("/api/petitions/{}/vote", petition),
            Some(user),
            Some(json!({ "vote_type": vote_type })),
        )
        .await
    }

    fn counts(body: &Value) -> (i64, i64) {
        (
            body["petition"]["yes_votes"].as_i64().unwrap(),
            body["petition"]["no_votes"].as_i64().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_voting_scenario() {
        let app = test_app();
        let creator = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let (status, petition) = send(
            &app,
            "POST",
            "/api/petitions",
            Some(creator),
            Some(json!({
                "title": "Add Solaris",
                "description": "The 1972 one",
                "movie_title": "Solaris",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = petition["id"].as_str().unwrap().to_string();

        let (_, body) = vote(&app, &id, a, "yes").await;
        assert_eq!(counts(&body), (1, 0));
        assert_eq!(body["outcome"], "recorded");

        let (_, body) = vote(&app, &id, b, "no").await;
        assert_eq!(counts(&body), (1, 1));

        let (_, body) = vote(&app, &id, a, "no").await;
        assert_eq!(counts(&body), (0, 2));
        assert_eq!(body["outcome"], "changed");
        assert_eq!(body["from"], "yes");

        let (status, body) = vote(&app, &id, a, "no").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(counts(&body), (0, 2));
        assert_eq!(body["outcome"], "unchanged");

        let (_, tally) = send(&app, "GET", &format!("/api/petitions/{}/tally", id), None, None).await;
        assert_eq!(tally["vote_rows"], 2);

        let (_, mine) = send(
            &app,
            "GET",
            &format!("/api/petitions/{}/vote", id),
            Some(a),
            None,
        )
        .await;
        assert_eq!(mine["vote"]["vote_type"], "no");

        let (_, detail) = send(&app, "GET", &format!("/api/petitions/{}", id), Some(b), None).await;
        assert_eq!(detail["user_vote"]["vote_type"], "no");
    }

    #[tokio::test]
    async fn test_invalid_vote_type_is_bad_request() {
        let app = test_app();
        let user = Uuid::new_v4();
        let (_, petition) = send(
            &app,
            "POST",
            "/api/petitions",
            Some(user),
            Some(json!({ "title": "t", "description": "d", "movie_title": "m" })),
        )
        .await;
        let id = petition["id"].as_str().unwrap().to_string();

        let (status, body) = vote(&app, &id, user, "abstain").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid vote type.");
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let app = test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/petitions",
            Some(Uuid::new_v4()),
            Some(json!({ "title": "Only a title" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = send(&app, "GET", "/api/petitions", None, None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_vote_absent_is_null() {
        let app = test_app();
        let user = Uuid::new_v4();
        let (_, petition) = send(
            &app,
            "POST",
            "/api/petitions",
            Some(user),
            Some(json!({ "title": "t", "description": "d", "movie_title": "m" })),
        )
        .await;

        let (status, body) = send(
            &app,
            "GET",
            &format!("/api/petitions/{}/vote", petition["id"].as_str().unwrap()),
            Some(user),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["vote"].is_null());
    }

    #[tokio::test]
    async fn test_vote_on_unknown_petition() {
        let app = test_app();
        let (status, _) = vote(&app, &Uuid::new_v4().to_string(), Uuid::new_v4(), "yes").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
