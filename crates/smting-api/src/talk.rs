use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use smting_core::reward::{DEFAULT_CATEGORY, NewPost};
use smting_types::api::{Claims, CreatePostRequest, CreatePostResponse};

use crate::blocking;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub category: Option<String>,
    pub limit: Option<u32>,
}

/// Publish a post; the author is credited the post reward when the cadence allows.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewPost {
        title: req.title,
        content: req.content,
        category: req.category,
    };
    let outcome = blocking(move || state.poster.create_post(&claims.sub, new)).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            post: outcome.post,
            rewarded: outcome.rewarded,
        }),
    ))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // The "all" tab shows every category.
    let category = query.category.filter(|c| c != DEFAULT_CATEGORY);
    let posts =
        blocking(move || state.poster.list_posts(category.as_deref(), query.limit)).await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = blocking(move || state.poster.get_post(&post_id)).await?;
    Ok(Json(post))
}
