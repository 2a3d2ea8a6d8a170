use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a stored or submitted token does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

string_enum!(Gender, "gender", { Male => "male", Female => "female" });

/// Role orientation used as the primary compatibility signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tendency {
    Dominant,
    Submissive,
    Switch,
}

string_enum!(Tendency, "tendency", {
    Dominant => "Dominant",
    Submissive => "Submissive",
    Switch => "Switch",
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub color: String,
    pub image_url: Option<String>,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            color: "#8B0000".to_string(),
            image_url: None,
        }
    }
}

/// A registered user. `balance` is the cached running total of the kane ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub nickname: String,
    pub age: u8,
    pub gender: Gender,
    pub tendency: Tendency,
    pub intro: String,
    pub interest_tags: BTreeSet<String>,
    pub top_tags: Vec<String>,
    pub location: Option<Location>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub balance: i64,
    pub avatar: Avatar,
    /// UTC date of the last post reward, used by the once-per-day cadence.
    pub last_reward_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Fields a user may change after registration. Gender is fixed at sign-up and
/// the balance only moves through the ledger, so neither appears here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub age: Option<u8>,
    pub intro: Option<String>,
    pub tendency: Option<Tendency>,
    pub avatar: Option<Avatar>,
    pub interest_tags: Option<BTreeSet<String>>,
    pub top_tags: Option<Vec<String>>,
    pub location: Option<Location>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the present fields onto `profile`.
    ///
    /// Replacing `interest_tags` without new `top_tags` drops any top tag that
    /// is no longer an interest, mirroring how deselecting a play also removes
    /// it from the favourites.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(nickname) = &self.nickname {
            profile.nickname = nickname.trim().to_string();
        }
        if let Some(age) = self.age {
            profile.age = age;
        }
        if let Some(intro) = &self.intro {
            profile.intro = intro.clone();
        }
        if let Some(tendency) = self.tendency {
            profile.tendency = tendency;
        }
        if let Some(avatar) = &self.avatar {
            profile.avatar = avatar.clone();
        }
        if let Some(tags) = &self.interest_tags {
            profile.interest_tags = tags.clone();
            if self.top_tags.is_none() {
                profile.top_tags.retain(|t| tags.contains(t));
            }
        }
        if let Some(top) = &self.top_tags {
            profile.top_tags = top.clone();
        }
        if let Some(location) = self.location {
            profile.location = Some(location);
        }
        if let Some(at) = self.last_active_at {
            profile.last_active_at = Some(at);
        }
    }
}

/// The part of a profile other users may see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: String,
    pub nickname: String,
    pub age: u8,
    pub gender: Gender,
    pub tendency: Tendency,
    pub intro: String,
    pub interest_tags: BTreeSet<String>,
    pub top_tags: Vec<String>,
    pub avatar: Avatar,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl From<&Profile> for PublicProfile {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id.clone(),
            nickname: p.nickname.clone(),
            age: p.age,
            gender: p.gender,
            tendency: p.tendency,
            intro: p.intro.clone(),
            interest_tags: p.interest_tags.clone(),
            top_tags: p.top_tags.clone(),
            avatar: p.avatar.clone(),
            last_active_at: p.last_active_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// The other participant from `user_id`'s point of view.
    pub fn counterpart(&self, user_id: &str) -> &str {
        if self.sender_id == user_id {
            &self.recipient_id
        } else {
            &self.sender_id
        }
    }
}

/// One row of the inbox: the latest message exchanged with a counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub counterpart_id: String,
    pub last_message: Message,
    pub unread: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxReason {
    MessageSend,
    /// Compensates a first-message charge whose message could not be stored.
    MessageRefund,
    TalkPost,
    Purchase,
}

string_enum!(TxReason, "transaction reason", {
    MessageSend => "message_send",
    MessageRefund => "message_refund",
    TalkPost => "talk_post",
    Purchase => "purchase",
});

/// Append-only ledger entry. Negative amounts are debits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTransaction {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub reason: TxReason,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkPost {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    AbusiveLanguage,
    Scam,
    Harassment,
    FakeProfile,
    SuspectedMinor,
    Other,
}

string_enum!(ReportReason, "report reason", {
    AbusiveLanguage => "abusive_language",
    Scam => "scam",
    Harassment => "harassment",
    FakeProfile => "fake_profile",
    SuspectedMinor => "suspected_minor",
    Other => "other",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub reporter_id: String,
    pub reported_id: String,
    pub reason: ReportReason,
    pub created_at: DateTime<Utc>,
}
