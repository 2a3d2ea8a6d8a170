use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use smting_core::wallet::KANE_PACKAGES;
use smting_types::api::{Claims, PurchaseRequest, WalletResponse};

use crate::blocking;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = blocking(move || state.wallet.history(&claims.sub, query.limit)).await?;
    Ok(Json(WalletResponse {
        balance: summary.balance,
        transactions: summary.transactions,
    }))
}

pub async fn packages() -> impl IntoResponse {
    Json(KANE_PACKAGES)
}

/// Credit a package whose payment the store front already captured.
pub async fn purchase(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = blocking(move || state.wallet.purchase(&claims.sub, req.kane)).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}
