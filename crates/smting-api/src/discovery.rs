use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use serde::Deserialize;

use smting_core::discovery::{self, DiscoveryContext, DiscoveryTab};
use smting_types::api::{Claims, ProfileView};
use smting_types::models::Tendency;

use crate::blocking;
use crate::error::ApiError;
use crate::profiles::profile_view;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    pub tab: DiscoveryTab,
    pub tendency: Option<TendencyFilter>,
    pub max_distance_km: Option<f64>,
}

/// `?tendency=` takes one tendency or `any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TendencyFilter {
    #[serde(rename = "any")]
    Any,
    Dominant,
    Submissive,
    Switch,
}

impl TendencyFilter {
    pub fn tendency(self) -> Option<Tendency> {
        match self {
            Self::Any => None,
            Self::Dominant => Some(Tendency::Dominant),
            Self::Submissive => Some(Tendency::Submissive),
            Self::Switch => Some(Tendency::Switch),
        }
    }
}

pub async fn discover(
    State(state): State<AppState>,
    query: Result<Query<DiscoverQuery>, QueryRejection>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if query
        .max_distance_km
        .is_some_and(|km| !km.is_finite() || km <= 0.0)
    {
        return Err(ApiError::BadRequest(
            "max_distance_km must be a positive number".into(),
        ));
    }

    let ctx = DiscoveryContext::for_tab(query.tab)
        .with_tendency(query.tendency.and_then(TendencyFilter::tendency))
        .with_max_distance(query.max_distance_km);

    let ranked = blocking(move || {
        discovery::discover(
            &*state.db,
            &*state.clock,
            &state.discovery,
            &claims.sub,
            &ctx,
        )
    })
    .await?;

    let views: Vec<ProfileView> = ranked.into_iter().map(profile_view).collect();
    Ok(Json(views))
}
