use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use chrono::Duration;
use smting_core::config::{
    DEFAULT_NEARBY_RADIUS_KM, DiscoveryDefaults, Economy, FIRST_MESSAGE_COST, POST_REWARD,
    RECENT_ACTIVITY_HOURS, RewardCadence,
};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub economy: Economy,
    pub discovery: DiscoveryDefaults,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset keys fall back to defaults;
    /// set but unparsable ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("SMTING_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SMTING_JWT_SECRET is unset or still a placeholder");
        }

        let economy = Economy {
            first_message_cost: parse_or(&lookup, "SMTING_FIRST_MESSAGE_COST", FIRST_MESSAGE_COST)?,
            post_reward: parse_or(&lookup, "SMTING_POST_REWARD", POST_REWARD)?,
            reward_cadence: parse_or(&lookup, "SMTING_REWARD_CADENCE", RewardCadence::default())?,
        };
        if economy.first_message_cost < 0 || economy.post_reward < 0 {
            bail!("kane amounts must not be negative");
        }

        let nearby_radius_km: f64 =
            parse_or(&lookup, "SMTING_NEARBY_RADIUS_KM", DEFAULT_NEARBY_RADIUS_KM)?;
        if !nearby_radius_km.is_finite() || nearby_radius_km <= 0.0 {
            bail!("SMTING_NEARBY_RADIUS_KM must be a positive number");
        }
        let recent_hours: i64 =
            parse_or(&lookup, "SMTING_RECENT_WINDOW_HOURS", RECENT_ACTIVITY_HOURS)?;
        if recent_hours <= 0 {
            bail!("SMTING_RECENT_WINDOW_HOURS must be positive");
        }

        Ok(Self {
            host: lookup("SMTING_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "SMTING_PORT", 3000)?,
            db_path: lookup("SMTING_DB_PATH")
                .unwrap_or_else(|| "smting.db".into())
                .into(),
            jwt_secret,
            economy,
            discovery: DiscoveryDefaults {
                nearby_radius_km,
                recent_window: Duration::hours(recent_hours),
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {key}: {raw:?} ({e})")),
        None => Ok(default),
    }
}
