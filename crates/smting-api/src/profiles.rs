use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use smting_core::discovery::RankedProfile;
use smting_core::profiles::{self, NewProfile};
use smting_types::api::{Claims, LocationRequest, ProfileView, RegisterProfileRequest};
use smting_types::models::{Location, ProfileUpdate, PublicProfile};

use crate::blocking;
use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn profile_view(ranked: RankedProfile) -> ProfileView {
    ProfileView {
        profile: PublicProfile::from(&ranked.profile),
        match_rate: ranked.match_rate,
        distance_km: ranked.distance_km,
    }
}

/// Create the caller's profile. The id comes from the token.
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RegisterProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewProfile {
        id: claims.sub,
        nickname: req.nickname,
        age: req.age,
        gender: req.gender,
        tendency: req.tendency,
        intro: req.intro,
        interest_tags: req.interest_tags,
        top_tags: req.top_tags,
        avatar: req.avatar,
        location: req.location,
    };
    let profile = blocking(move || profiles::register(&*state.db, &*state.clock, new)).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// The caller's own profile, balance included.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = blocking(move || profiles::get(&*state.db, &claims.sub)).await?;
    Ok(Json(profile))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    // Activity is stamped by the server, never taken from the client.
    update.last_active_at = None;
    let profile = blocking(move || profiles::update(&*state.db, &claims.sub, &update)).await?;
    Ok(Json(profile))
}

pub async fn update_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<LocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = Location {
        latitude: req.latitude,
        longitude: req.longitude,
    };
    let profile = blocking(move || {
        profiles::update_location(&*state.db, &*state.clock, &claims.sub, location)
    })
    .await?;
    Ok(Json(profile))
}

pub async fn touch_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || profiles::touch_activity(&*state.db, &*state.clock, &claims.sub)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Someone else's profile with the caller's match rate and distance.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let ranked = blocking(move || profiles::view(&*state.db, &claims.sub, &user_id)).await?;
    Ok(Json(profile_view(ranked)))
}
