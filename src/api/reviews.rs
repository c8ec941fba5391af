use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::auth::ActingUser;
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::review::Review;
use crate::models::review_report::ReviewReport;
use crate::services::moderation;

#[derive(Debug, Deserialize)]
pub struct EditReviewRequest {
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportReviewRequest {
    pub reason: Option<String>,
}

async fn edit_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: ActingUser,
    Json(req): Json<EditReviewRequest>,
) -> Result<Json<Review>> {
    let review =
        moderation::edit_review(state.store.as_ref(), id, user.user_id, &req.comment).await?;
    Ok(Json(review))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: ActingUser,
) -> Result<StatusCode> {
    moderation::delete_review(state.store.as_ref(), id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The body is optional; when present it must be a valid request.
fn parse_report_body(body: &[u8]) -> Result<ReportReviewRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReportReviewRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid report body: {}", e)))
}

async fn report_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: ActingUser,
    body: Bytes,
) -> Result<Json<ReviewReport>> {
    let reason = parse_report_body(&body)?.reason;
    let report = moderation::report_review(state.store.as_ref(), id, user.user_id, reason).await?;
    Ok(Json(report))
}

async fn list_reports(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _user: ActingUser,
) -> Result<Json<Vec<ReviewReport>>> {
    let reports = moderation::list_reports(state.store.as_ref(), id).await?;
    Ok(Json(reports))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reviews/:id", put(edit_review).delete(delete_review))
        .route("/api/reviews/:id/report", post(report_review))
        .route("/api/reviews/:id/reports", get(list_reports))
}
