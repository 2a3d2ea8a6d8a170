use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use smting_types::api::{
    ChargeQuote, Claims, MarkReadResponse, SendMessageRequest, UnreadCountResponse,
};

use crate::blocking;
use crate::error::ApiError;
use crate::state::AppState;

/// Send to `user_id`. The first message of a conversation costs kane; a
/// sender who cannot pay gets 402 with their balance and the price.
pub async fn send_message(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message =
        blocking(move || state.gate.send_message(&claims.sub, &user_id, &req.content)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Both directions with `user_id`, oldest first.
pub async fn conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = blocking(move || state.inbox.conversation(&claims.sub, &user_id)).await?;
    Ok(Json(messages))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let marked = blocking(move || state.inbox.mark_read(&claims.sub, &user_id)).await?;
    Ok(Json(MarkReadResponse { marked }))
}

pub async fn quote(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let q = blocking(move || state.gate.quote(&claims.sub, &user_id)).await?;
    Ok(Json(ChargeQuote {
        started: q.started,
        cost: q.cost,
        balance: q.balance,
    }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let count = blocking(move || state.inbox.unread_count(&claims.sub)).await?;
    Ok(Json(UnreadCountResponse { count }))
}

pub async fn threads(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let threads = blocking(move || state.inbox.threads(&claims.sub)).await?;
    Ok(Json(threads))
}
