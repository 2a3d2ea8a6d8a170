//! First-message gate.
//!
//! A conversation between two users exists as soon as one message exists in
//! either direction; there is no separate "has paid" flag. Opening one costs
//! the sender [`Economy::first_message_cost`] kane, every later message in
//! either direction is free.
//!
//! Sends for the same unordered pair are serialized with a lock keyed by the
//! sorted ids, so a double tap cannot observe "not started" twice. The store's
//! non-negative balance guard backs this up across processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use smting_types::models::{Message, TxReason};

use crate::clock::Clock;
use crate::config::Economy;
use crate::error::{CoreError, StoreError, ValidationError};
use crate::store::{MessageStore, ProfileStore, TransactionStore};
use crate::validate;

type PairKey = (String, String);

fn pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Per-pair mutexes, created on demand and dropped when nobody holds them.
#[derive(Default)]
struct PairLocks {
    slots: Mutex<HashMap<PairKey, Arc<Mutex<()>>>>,
}

impl PairLocks {
    fn slot(&self, key: &PairKey) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(slots.entry(key.clone()).or_default().clone())
    }

    fn release(&self, key: &PairKey, slot: Arc<Mutex<()>>) {
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        // Only the map and `slot` itself left: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        // Drop our handle while the map is still locked so the next releaser
        // sees an accurate count.
        drop(slot);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Whether messaging a counterpart is free, and what the sender holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub started: bool,
    pub cost: i64,
    pub balance: i64,
}

pub struct ConversationGate {
    profiles: Arc<dyn ProfileStore>,
    messages: Arc<dyn MessageStore>,
    ledger: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
    economy: Economy,
    locks: PairLocks,
}

impl ConversationGate {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        messages: Arc<dyn MessageStore>,
        ledger: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
        economy: Economy,
    ) -> Self {
        Self {
            profiles,
            messages,
            ledger,
            clock,
            economy,
            locks: PairLocks::default(),
        }
    }

    pub fn first_message_cost(&self) -> i64 {
        self.economy.first_message_cost
    }

    /// What sending to `recipient_id` would cost `sender_id` right now.
    pub fn quote(&self, sender_id: &str, recipient_id: &str) -> Result<Quote, CoreError> {
        if sender_id == recipient_id {
            return Err(ValidationError::SelfTarget.into());
        }
        let sender = self
            .profiles
            .get_profile(sender_id)?
            .ok_or_else(|| CoreError::ProfileNotFound(sender_id.to_string()))?;
        if self.profiles.get_profile(recipient_id)?.is_none() {
            return Err(CoreError::ProfileNotFound(recipient_id.to_string()));
        }
        let started = self.messages.has_messages_between(sender_id, recipient_id)?;

        Ok(Quote {
            started,
            cost: if started { 0 } else { self.economy.first_message_cost },
            balance: sender.balance,
        })
    }

    /// Send a message, charging the sender if it opens the conversation.
    ///
    /// On a first message the debit is recorded before the message is
    /// written. If the write fails the debit is reversed with a
    /// `message_refund` entry and `TransactionPersistence` is returned.
    pub fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Result<Message, CoreError> {
        if sender_id == recipient_id {
            return Err(ValidationError::SelfTarget.into());
        }
        validate::message_content(content)?;
        if self.profiles.get_profile(recipient_id)?.is_none() {
            return Err(CoreError::ProfileNotFound(recipient_id.to_string()));
        }

        let key = pair_key(sender_id, recipient_id);
        let slot = self.locks.slot(&key)?;
        let result = match slot.lock() {
            Ok(_guard) => self.send_locked(sender_id, recipient_id, content),
            Err(e) => Err(StoreError::LockPoisoned(e.to_string()).into()),
        };
        self.locks.release(&key, slot);
        result
    }

    fn send_locked(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Result<Message, CoreError> {
        if self.messages.has_messages_between(sender_id, recipient_id)? {
            debug!(sender = sender_id, recipient = recipient_id, "Conversation already started");
            return self
                .messages
                .insert_message(sender_id, recipient_id, content, self.clock.now())
                .map_err(CoreError::TransactionPersistence);
        }

        let cost = self.economy.first_message_cost;
        let sender = self
            .profiles
            .get_profile(sender_id)?
            .ok_or_else(|| CoreError::ProfileNotFound(sender_id.to_string()))?;
        if sender.balance < cost {
            return Err(CoreError::InsufficientBalance {
                balance: sender.balance,
                required: cost,
            });
        }

        if cost > 0 {
            match self
                .ledger
                .insert_transaction(sender_id, -cost, TxReason::MessageSend, self.clock.now())
            {
                Ok(_) => {}
                Err(StoreError::InsufficientFunds { balance, .. }) => {
                    return Err(CoreError::InsufficientBalance {
                        balance,
                        required: cost,
                    });
                }
                Err(StoreError::NotFound { .. }) => {
                    return Err(CoreError::ProfileNotFound(sender_id.to_string()));
                }
                Err(e) => return Err(CoreError::TransactionPersistence(e)),
            }
        }

        match self
            .messages
            .insert_message(sender_id, recipient_id, content, self.clock.now())
        {
            Ok(message) => {
                info!(
                    sender = sender_id,
                    recipient = recipient_id,
                    cost,
                    "Conversation opened"
                );
                Ok(message)
            }
            Err(e) => {
                warn!(
                    sender = sender_id,
                    recipient = recipient_id,
                    error = %e,
                    "Message write failed after charge, refunding"
                );
                if cost > 0 {
                    if let Err(refund_err) = self.ledger.insert_transaction(
                        sender_id,
                        cost,
                        TxReason::MessageRefund,
                        self.clock.now(),
                    ) {
                        error!(
                            sender = sender_id,
                            cost,
                            error = %refund_err,
                            "Refund of first-message charge failed"
                        );
                    }
                }
                Err(CoreError::TransactionPersistence(e))
            }
        }
    }
}
