use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{
    Avatar, CurrencyTransaction, Gender, Location, PublicProfile, ReportReason, TalkPost, Tendency,
};

// -- JWT Claims --

/// Claims of the bearer token issued by the auth provider. `sub` is the
/// profile id of the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Profiles --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterProfileRequest {
    pub nickname: String,
    pub age: u8,
    pub gender: Gender,
    pub tendency: Tendency,
    #[serde(default)]
    pub intro: String,
    pub interest_tags: BTreeSet<String>,
    #[serde(default)]
    pub top_tags: Vec<String>,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// Another user's profile as seen by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub match_rate: u8,
    pub distance_km: Option<f64>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

/// What sending to a counterpart would cost right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeQuote {
    pub started: bool,
    pub cost: i64,
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub marked: usize,
}

// -- Talk --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostResponse {
    pub post: TalkPost,
    /// Kane credited for the post; 0 when the reward was skipped or failed.
    pub rewarded: i64,
}

// -- Kane --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PurchaseRequest {
    pub kane: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub balance: i64,
    pub transactions: Vec<CurrencyTransaction>,
}

// -- Reports --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportRequest {
    pub reported_id: String,
    pub reason: ReportReason,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<i64>,
}
