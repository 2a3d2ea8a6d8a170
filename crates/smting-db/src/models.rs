//! Database row types. These map directly to SQLite rows and stay
//! stringly-typed; decoding into `smting-types` models happens here so the
//! query code never parses columns by hand.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;

use smting_types::models::{
    Avatar, CurrencyTransaction, Location, Message, Profile, Report, TalkPost,
};

use crate::error::DbError;

pub const PROFILE_COLUMNS: &str = "id, nickname, age, gender, tendency, intro, interest_tags, \
     top_tags, latitude, longitude, last_active_at, balance, avatar_color, avatar_image_url, \
     last_reward_on, created_at";

pub const MESSAGE_COLUMNS: &str = "id, sender_id, recipient_id, content, created_at, read_at";

pub const TRANSACTION_COLUMNS: &str = "id, user_id, amount, reason, created_at";

pub const POST_COLUMNS: &str = "id, author_id, title, content, category, created_at";

/// Timestamps are stored as fixed-width RFC 3339 strings so they sort lexically.
pub fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn decode_time(column: &'static str, id: &str, raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corrupt(column, id, e))
}

fn decode_opt_time(
    column: &'static str,
    id: &str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, DbError> {
    raw.map(|r| decode_time(column, id, r)).transpose()
}

fn decode_enum<T>(column: &'static str, id: &str, raw: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| corrupt(column, id, e))
}

fn corrupt(column: &'static str, id: &str, detail: impl std::fmt::Display) -> DbError {
    DbError::Corrupt {
        column,
        id: id.to_string(),
        detail: detail.to_string(),
    }
}

pub struct ProfileRow {
    pub id: String,
    pub nickname: String,
    pub age: i64,
    pub gender: String,
    pub tendency: String,
    pub intro: String,
    pub interest_tags: String,
    pub top_tags: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_active_at: Option<String>,
    pub balance: i64,
    pub avatar_color: String,
    pub avatar_image_url: Option<String>,
    pub last_reward_on: Option<String>,
    pub created_at: String,
}

impl ProfileRow {
    pub fn from_profile(profile: &Profile) -> Result<Self, DbError> {
        let interest_tags = serde_json::to_string(&profile.interest_tags)
            .map_err(|e| corrupt("interest_tags", &profile.id, e))?;
        let top_tags = serde_json::to_string(&profile.top_tags)
            .map_err(|e| corrupt("top_tags", &profile.id, e))?;
        Ok(Self {
            id: profile.id.clone(),
            nickname: profile.nickname.clone(),
            age: i64::from(profile.age),
            gender: profile.gender.as_str().to_string(),
            tendency: profile.tendency.as_str().to_string(),
            intro: profile.intro.clone(),
            interest_tags,
            top_tags,
            latitude: profile.location.map(|l| l.latitude),
            longitude: profile.location.map(|l| l.longitude),
            last_active_at: profile.last_active_at.map(encode_time),
            balance: profile.balance,
            avatar_color: profile.avatar.color.clone(),
            avatar_image_url: profile.avatar.image_url.clone(),
            last_reward_on: profile.last_reward_on.map(encode_date),
            created_at: encode_time(profile.created_at),
        })
    }

    /// Reads a row selected with [`PROFILE_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            nickname: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            tendency: row.get(4)?,
            intro: row.get(5)?,
            interest_tags: row.get(6)?,
            top_tags: row.get(7)?,
            latitude: row.get(8)?,
            longitude: row.get(9)?,
            last_active_at: row.get(10)?,
            balance: row.get(11)?,
            avatar_color: row.get(12)?,
            avatar_image_url: row.get(13)?,
            last_reward_on: row.get(14)?,
            created_at: row.get(15)?,
        })
    }

    pub fn into_profile(self) -> Result<Profile, DbError> {
        let id = self.id;
        let age = u8::try_from(self.age).map_err(|e| corrupt("age", &id, e))?;
        let interest_tags: BTreeSet<String> = serde_json::from_str(&self.interest_tags)
            .map_err(|e| corrupt("interest_tags", &id, e))?;
        let top_tags: Vec<String> =
            serde_json::from_str(&self.top_tags).map_err(|e| corrupt("top_tags", &id, e))?;
        // Both halves or neither; a half-written pair counts as unknown.
        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        };
        let last_reward_on = self
            .last_reward_on
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| corrupt("last_reward_on", &id, e))
            })
            .transpose()?;

        Ok(Profile {
            nickname: self.nickname,
            age,
            gender: decode_enum("gender", &id, &self.gender)?,
            tendency: decode_enum("tendency", &id, &self.tendency)?,
            intro: self.intro,
            interest_tags,
            top_tags,
            location,
            last_active_at: decode_opt_time("last_active_at", &id, self.last_active_at.as_deref())?,
            balance: self.balance,
            avatar: Avatar {
                color: self.avatar_color,
                image_url: self.avatar_image_url,
            },
            last_reward_on,
            created_at: decode_time("created_at", &id, &self.created_at)?,
            id,
        })
    }
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

impl MessageRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            recipient_id: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
            read_at: row.get(5)?,
        })
    }

    pub fn into_message(self) -> Result<Message, DbError> {
        Ok(Message {
            created_at: decode_time("created_at", &self.id, &self.created_at)?,
            read_at: decode_opt_time("read_at", &self.id, self.read_at.as_deref())?,
            id: self.id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            content: self.content,
        })
    }
}

pub struct TransactionRow {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub reason: String,
    pub created_at: String,
}

impl TransactionRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            reason: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    pub fn into_transaction(self) -> Result<CurrencyTransaction, DbError> {
        Ok(CurrencyTransaction {
            reason: decode_enum("reason", &self.id, &self.reason)?,
            created_at: decode_time("created_at", &self.id, &self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
        })
    }
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: String,
}

impl PostRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            category: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn into_post(self) -> Result<TalkPost, DbError> {
        Ok(TalkPost {
            created_at: decode_time("created_at", &self.id, &self.created_at)?,
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            content: self.content,
            category: self.category,
        })
    }
}

pub struct ReportRow {
    pub id: String,
    pub reporter_id: String,
    pub reported_id: String,
    pub reason: String,
    pub created_at: String,
}

impl ReportRow {
    pub fn into_report(self) -> Result<Report, DbError> {
        Ok(Report {
            reason: decode_enum("reason", &self.id, &self.reason)?,
            created_at: decode_time("created_at", &self.id, &self.created_at)?,
            id: self.id,
            reporter_id: self.reporter_id,
            reported_id: self.reported_id,
        })
    }
}
