use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the caller's user id, set by the fronting auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
///
/// Rejects with 401 when the header is missing or not a UUID.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser {
    pub user_id: Uuid,
}

/// The caller on routes that also serve anonymous requests.
///
/// A missing header yields `None`; a header that is present but not a UUID
/// still rejects with 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeActingUser(pub Option<Uuid>);

fn user_from_headers(parts: &Parts) -> Result<Option<Uuid>, AppError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(Some)
        .ok_or(AppError::Unauthenticated)
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = user_from_headers(parts)?.ok_or(AppError::Unauthenticated)?;
        Ok(ActingUser { user_id })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeActingUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeActingUser(user_from_headers(parts)?))
    }
}
