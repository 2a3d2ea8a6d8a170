use axum::{
    Extension, Json, extract::State, http::StatusCode, response::IntoResponse,
};

use smting_core::reports;
use smting_types::api::{Claims, ReportRequest};

use crate::blocking;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn file_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = blocking(move || {
        reports::file_report(
            &*state.db,
            &*state.db,
            &*state.clock,
            &claims.sub,
            &req.reported_id,
            req.reason,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(report)))
}
