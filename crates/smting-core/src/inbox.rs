//! Reading side of messaging: conversations, read receipts, unread badge.

use std::sync::Arc;

use smting_types::models::{Message, ThreadSummary};

use crate::clock::Clock;
use crate::error::{CoreError, ValidationError};
use crate::store::MessageStore;

pub struct Inbox {
    messages: Arc<dyn MessageStore>,
    clock: Arc<dyn Clock>,
}

impl Inbox {
    pub fn new(messages: Arc<dyn MessageStore>, clock: Arc<dyn Clock>) -> Self {
        Self { messages, clock }
    }

    /// Both directions between `user_id` and `other_id`, oldest first.
    pub fn conversation(&self, user_id: &str, other_id: &str) -> Result<Vec<Message>, CoreError> {
        if user_id == other_id {
            return Err(ValidationError::SelfTarget.into());
        }
        Ok(self.messages.list_messages(user_id, other_id)?)
    }

    /// Mark everything `sender_id` sent to `recipient_id` as read.
    pub fn mark_read(&self, recipient_id: &str, sender_id: &str) -> Result<usize, CoreError> {
        Ok(self
            .messages
            .mark_read(recipient_id, sender_id, self.clock.now())?)
    }

    pub fn unread_count(&self, recipient_id: &str) -> Result<u64, CoreError> {
        Ok(self.messages.unread_count(recipient_id)?)
    }

    pub fn threads(&self, user_id: &str) -> Result<Vec<ThreadSummary>, CoreError> {
        Ok(self.messages.list_threads(user_id)?)
    }
}
