//! Talk posts and the kane reward for writing them.
//!
//! Post and reward are linked best-effort: once the post is stored it is
//! returned even if crediting the author fails, and the failure is logged.

use std::sync::Arc;

use tracing::{error, info};

use smting_types::models::{TalkPost, TxReason};

use crate::clock::Clock;
use crate::config::{Economy, RewardCadence};
use crate::error::{CoreError, ValidationError};
use crate::store::{PostStore, ProfileStore, TransactionStore};

pub const DEFAULT_CATEGORY: &str = "all";
pub const TITLE_MAX_CHARS: usize = 100;
pub const DEFAULT_FEED_LIMIT: u32 = 50;
pub const MAX_FEED_LIMIT: u32 = 200;

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: Option<String>,
    pub content: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    pub post: TalkPost,
    /// Kane credited; 0 when the cadence skipped the reward or crediting failed.
    pub rewarded: i64,
}

pub struct RewardPoster {
    posts: Arc<dyn PostStore>,
    profiles: Arc<dyn ProfileStore>,
    ledger: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
    economy: Economy,
}

/// Title shown in the feed: the given one, or the start of the content.
fn effective_title(title: Option<&str>, content: &str) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.chars().take(TITLE_MAX_CHARS).collect(),
        None => content.trim().chars().take(TITLE_MAX_CHARS).collect(),
    }
}

impl RewardPoster {
    pub fn new(
        posts: Arc<dyn PostStore>,
        profiles: Arc<dyn ProfileStore>,
        ledger: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
        economy: Economy,
    ) -> Self {
        Self {
            posts,
            profiles,
            ledger,
            clock,
            economy,
        }
    }

    pub fn create_post(&self, author_id: &str, new: NewPost) -> Result<PostOutcome, CoreError> {
        if new.content.trim().is_empty() {
            return Err(ValidationError::EmptyPost.into());
        }
        if self.profiles.get_profile(author_id)?.is_none() {
            return Err(CoreError::ProfileNotFound(author_id.to_string()));
        }

        let title = effective_title(new.title.as_deref(), &new.content);
        let category = new
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);

        let now = self.clock.now();
        let post = self
            .posts
            .insert_post(author_id, &title, &new.content, category, now)?;

        let rewarded = self.grant_reward(author_id, &post);
        Ok(PostOutcome { post, rewarded })
    }

    fn grant_reward(&self, author_id: &str, post: &TalkPost) -> i64 {
        let amount = self.economy.post_reward;
        if amount <= 0 {
            return 0;
        }

        if self.economy.reward_cadence == RewardCadence::OncePerDay {
            let today = self.clock.now().date_naive();
            match self.profiles.claim_daily_reward(author_id, today) {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        author = author_id,
                        post = %post.id,
                        "Daily post reward already granted"
                    );
                    return 0;
                }
                Err(e) => {
                    error!(
                        author = author_id,
                        post = %post.id,
                        error = %e,
                        "Could not claim daily post reward"
                    );
                    return 0;
                }
            }
        }

        match self
            .ledger
            .insert_transaction(author_id, amount, TxReason::TalkPost, self.clock.now())
        {
            Ok(_) => {
                info!(author = author_id, post = %post.id, amount, "Post reward granted");
                amount
            }
            Err(e) => {
                error!(author = author_id, post = %post.id, error = %e, "Post reward failed");
                0
            }
        }
    }

    pub fn get_post(&self, id: &str) -> Result<TalkPost, CoreError> {
        self.posts.get_post(id)?.ok_or_else(|| CoreError::NotFound {
            entity: "post",
            id: id.to_string(),
        })
    }

    pub fn list_posts(
        &self,
        category: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<TalkPost>, CoreError> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT);
        Ok(self.posts.list_posts(category, limit)?)
    }
}
