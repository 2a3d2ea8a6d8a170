//! Persistence collaborators. The core only talks to storage through these
//! traits; `smting-db` implements all of them on one SQLite database.

use chrono::{DateTime, NaiveDate, Utc};

use smting_types::models::{
    CurrencyTransaction, Message, Profile, ProfileUpdate, Report, ReportReason, TalkPost,
    ThreadSummary, TxReason,
};

use crate::error::{StoreError, ValidationError};

pub type StoreResult<T> = Result<T, StoreError>;

pub trait ProfileStore: Send + Sync {
    fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>>;

    /// Every profile except `exclude_id`.
    fn list_profiles(&self, exclude_id: &str) -> StoreResult<Vec<Profile>>;

    fn insert_profile(&self, profile: &Profile) -> StoreResult<()>;

    /// Apply the present fields of `update` to the current row and return the
    /// result. `check` sees the merged profile in the same unit of work as the
    /// write; if it fails the store answers `Rejected` and writes nothing.
    /// `NotFound` if the profile is missing.
    fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
        check: &dyn Fn(&Profile) -> Result<(), ValidationError>,
    ) -> StoreResult<Profile>;

    /// Record `date` as the day of the last post reward, unless a reward was
    /// already recorded on or after it. Returns whether the claim succeeded.
    fn claim_daily_reward(&self, id: &str, date: NaiveDate) -> StoreResult<bool>;
}

pub trait MessageStore: Send + Sync {
    /// Messages between `a` and `b` in both directions, oldest first.
    fn list_messages(&self, a: &str, b: &str) -> StoreResult<Vec<Message>>;

    /// Whether any message exists between `a` and `b`, in either direction.
    fn has_messages_between(&self, a: &str, b: &str) -> StoreResult<bool>;

    fn insert_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Message>;

    /// Stamp `read_at` on every unread message from `sender_id` to
    /// `recipient_id`. Returns how many were marked.
    fn mark_read(&self, recipient_id: &str, sender_id: &str, at: DateTime<Utc>)
    -> StoreResult<usize>;

    fn unread_count(&self, recipient_id: &str) -> StoreResult<u64>;

    /// One summary per counterpart of `user_id`, most recent conversation first.
    fn list_threads(&self, user_id: &str) -> StoreResult<Vec<ThreadSummary>>;
}

pub trait TransactionStore: Send + Sync {
    /// Append a ledger entry and move the cached balance by `amount` as one
    /// unit. Fails with `InsufficientFunds` instead of letting the balance go
    /// negative, and with `NotFound` if the user does not exist.
    fn insert_transaction(
        &self,
        user_id: &str,
        amount: i64,
        reason: TxReason,
        at: DateTime<Utc>,
    ) -> StoreResult<CurrencyTransaction>;

    /// Most recent entries first.
    fn list_transactions(&self, user_id: &str, limit: u32) -> StoreResult<Vec<CurrencyTransaction>>;
}

pub trait PostStore: Send + Sync {
    fn insert_post(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
        category: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<TalkPost>;

    fn get_post(&self, id: &str) -> StoreResult<Option<TalkPost>>;

    /// Newest first, optionally restricted to one category.
    fn list_posts(&self, category: Option<&str>, limit: u32) -> StoreResult<Vec<TalkPost>>;
}

pub trait ReportStore: Send + Sync {
    fn insert_report(
        &self,
        reporter_id: &str,
        reported_id: &str,
        reason: ReportReason,
        at: DateTime<Utc>,
    ) -> StoreResult<Report>;
}
