use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Kane charged to open a conversation with someone new.
pub const FIRST_MESSAGE_COST: i64 = 3;

/// Kane credited for writing a talk post.
pub const POST_REWARD: i64 = 30;

/// Radius of the "nearby" tabs when the caller gives no distance cap.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 20.0;

/// How far back `lastActiveAt` may lie for the "recent" tabs.
pub const RECENT_ACTIVITY_HOURS: i64 = 10;

/// How often a user can earn the post reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCadence {
    /// Every post is rewarded.
    #[default]
    PerPost,
    /// Only the first post of each UTC day is rewarded.
    OncePerDay,
}

impl FromStr for RewardCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_post" => Ok(Self::PerPost),
            "once_per_day" => Ok(Self::OncePerDay),
            other => Err(format!("unknown reward cadence {other:?}")),
        }
    }
}

/// Prices and rewards of the kane economy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Economy {
    pub first_message_cost: i64,
    pub post_reward: i64,
    pub reward_cadence: RewardCadence,
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            first_message_cost: FIRST_MESSAGE_COST,
            post_reward: POST_REWARD,
            reward_cadence: RewardCadence::PerPost,
        }
    }
}

/// Filter defaults of the discovery tabs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoveryDefaults {
    pub nearby_radius_km: f64,
    pub recent_window: Duration,
}

impl Default for DiscoveryDefaults {
    fn default() -> Self {
        Self {
            nearby_radius_km: DEFAULT_NEARBY_RADIUS_KM,
            recent_window: Duration::hours(RECENT_ACTIVITY_HOURS),
        }
    }
}
