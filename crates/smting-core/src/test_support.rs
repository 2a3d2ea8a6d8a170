//! In-memory store with failure injection for the core's unit tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use smting_types::models::{
    Avatar, CurrencyTransaction, Gender, Message, Profile, ProfileUpdate, Report, ReportReason,
    TalkPost, Tendency, ThreadSummary, TxReason,
};

use crate::error::{StoreError, ValidationError};
use crate::store::{
    MessageStore, PostStore, ProfileStore, ReportStore, StoreResult, TransactionStore,
};

pub fn profile(id: &str, gender: Gender, tendency: Tendency, tags: &[&str]) -> Profile {
    Profile {
        id: id.to_string(),
        nickname: format!("nick-{id}"),
        age: 27,
        gender,
        tendency,
        intro: String::new(),
        interest_tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
        top_tags: Vec::new(),
        location: None,
        last_active_at: None,
        balance: 0,
        avatar: Avatar::default(),
        last_reward_on: None,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
struct Inner {
    profiles: HashMap<String, Profile>,
    messages: Vec<Message>,
    transactions: Vec<CurrencyTransaction>,
    posts: Vec<TalkPost>,
    reports: Vec<Report>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    pub fail_message_insert: AtomicBool,
    pub fail_debit: AtomicBool,
    pub fail_credit: AtomicBool,
    pub fail_post_insert: AtomicBool,
}

fn injected(what: &str) -> StoreError {
    StoreError::Backend(format!("injected failure: {what}").into())
}

impl MemoryStore {
    pub fn put(&self, profile: Profile) {
        self.inner.lock().unwrap().profiles.insert(profile.id.clone(), profile);
    }

    pub fn balance(&self, id: &str) -> i64 {
        self.inner.lock().unwrap().profiles[id].balance
    }

    pub fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    pub fn transactions_of(&self, id: &str) -> Vec<CurrencyTransaction> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == id)
            .cloned()
            .collect()
    }
}

fn between(m: &Message, a: &str, b: &str) -> bool {
    (m.sender_id == a && m.recipient_id == b) || (m.sender_id == b && m.recipient_id == a)
}

impl ProfileStore for MemoryStore {
    fn get_profile(&self, id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.inner.lock().unwrap().profiles.get(id).cloned())
    }

    fn list_profiles(&self, exclude_id: &str) -> StoreResult<Vec<Profile>> {
        let inner = self.inner.lock().unwrap();
        let mut all: Vec<Profile> = inner
            .profiles
            .values()
            .filter(|p| p.id != exclude_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    fn insert_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.put(profile.clone());
        Ok(())
    }

    fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
        check: &dyn Fn(&Profile) -> Result<(), ValidationError>,
    ) -> StoreResult<Profile> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner
            .profiles
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("profile", id))?;
        let mut merged = profile.clone();
        update.apply_to(&mut merged);
        check(&merged)?;
        *profile = merged.clone();
        Ok(merged)
    }

    fn claim_daily_reward(&self, id: &str, date: NaiveDate) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner
            .profiles
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("profile", id))?;
        if profile.last_reward_on.is_some_and(|d| d >= date) {
            return Ok(false);
        }
        profile.last_reward_on = Some(date);
        Ok(true)
    }
}

impl MessageStore for MemoryStore {
    fn list_messages(&self, a: &str, b: &str) -> StoreResult<Vec<Message>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.messages.iter().filter(|m| between(m, a, b)).cloned().collect())
    }

    fn has_messages_between(&self, a: &str, b: &str) -> StoreResult<bool> {
        Ok(self.inner.lock().unwrap().messages.iter().any(|m| between(m, a, b)))
    }

    fn insert_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Message> {
        if self.fail_message_insert.load(Ordering::SeqCst) {
            return Err(injected("insert_message"));
        }
        let message = Message {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            content: content.to_string(),
            created_at: at,
            read_at: None,
        };
        self.inner.lock().unwrap().messages.push(message.clone());
        Ok(message)
    }

    fn mark_read(
        &self,
        recipient_id: &str,
        sender_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<usize> {
        let mut inner = self.inner.lock().unwrap();
        let mut marked = 0;
        for m in inner.messages.iter_mut() {
            if m.sender_id == sender_id && m.recipient_id == recipient_id && m.read_at.is_none() {
                m.read_at = Some(at);
                marked += 1;
            }
        }
        Ok(marked)
    }

    fn unread_count(&self, recipient_id: &str) -> StoreResult<u64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.recipient_id == recipient_id && m.read_at.is_none())
            .count() as u64)
    }

    fn list_threads(&self, user_id: &str) -> StoreResult<Vec<ThreadSummary>> {
        let inner = self.inner.lock().unwrap();
        let mut threads: Vec<ThreadSummary> = Vec::new();
        for m in inner.messages.iter().rev() {
            if m.sender_id != user_id && m.recipient_id != user_id {
                continue;
            }
            let counterpart = m.counterpart(user_id).to_string();
            let unread = u64::from(m.recipient_id == user_id && m.read_at.is_none());
            match threads.iter_mut().find(|t| t.counterpart_id == counterpart) {
                Some(t) => t.unread += unread,
                None => threads.push(ThreadSummary {
                    counterpart_id: counterpart,
                    last_message: m.clone(),
                    unread,
                }),
            }
        }
        Ok(threads)
    }
}

impl TransactionStore for MemoryStore {
    fn insert_transaction(
        &self,
        user_id: &str,
        amount: i64,
        reason: TxReason,
        at: DateTime<Utc>,
    ) -> StoreResult<CurrencyTransaction> {
        if amount < 0 && self.fail_debit.load(Ordering::SeqCst) {
            return Err(injected("debit"));
        }
        if amount > 0 && self.fail_credit.load(Ordering::SeqCst) {
            return Err(injected("credit"));
        }
        let mut inner = self.inner.lock().unwrap();
        let profile = inner
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found("profile", user_id))?;
        if profile.balance + amount < 0 {
            return Err(StoreError::InsufficientFunds {
                balance: profile.balance,
                debit: -amount,
            });
        }
        profile.balance += amount;
        let tx = CurrencyTransaction {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount,
            reason,
            created_at: at,
        };
        inner.transactions.push(tx.clone());
        Ok(tx)
    }

    fn list_transactions(
        &self,
        user_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<CurrencyTransaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

impl PostStore for MemoryStore {
    fn insert_post(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
        category: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<TalkPost> {
        if self.fail_post_insert.load(Ordering::SeqCst) {
            return Err(injected("insert_post"));
        }
        let post = TalkPost {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            created_at: at,
        };
        self.inner.lock().unwrap().posts.push(post.clone());
        Ok(post)
    }

    fn get_post(&self, id: &str) -> StoreResult<Option<TalkPost>> {
        Ok(self.inner.lock().unwrap().posts.iter().find(|p| p.id == id).cloned())
    }

    fn list_posts(&self, category: Option<&str>, limit: u32) -> StoreResult<Vec<TalkPost>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .posts
            .iter()
            .rev()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

impl ReportStore for MemoryStore {
    fn insert_report(
        &self,
        reporter_id: &str,
        reported_id: &str,
        reason: ReportReason,
        at: DateTime<Utc>,
    ) -> StoreResult<Report> {
        let report = Report {
            id: Uuid::new_v4().to_string(),
            reporter_id: reporter_id.to_string(),
            reported_id: reported_id.to_string(),
            reason,
            created_at: at,
        };
        self.inner.lock().unwrap().reports.push(report.clone());
        Ok(report)
    }
}
