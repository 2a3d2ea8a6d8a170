//! Kane balance, purchase packages and ledger history.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use smting_types::models::{CurrencyTransaction, TxReason};

use crate::clock::Clock;
use crate::error::{CoreError, StoreError, ValidationError};
use crate::store::{ProfileStore, TransactionStore};

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KanePackage {
    pub kane: i64,
    pub price_won: u32,
}

/// Packages on sale. Payment capture happens outside this service.
pub const KANE_PACKAGES: [KanePackage; 4] = [
    KanePackage { kane: 100, price_won: 1_000 },
    KanePackage { kane: 300, price_won: 2_900 },
    KanePackage { kane: 700, price_won: 6_500 },
    KanePackage { kane: 1_500, price_won: 13_000 },
];

pub fn find_package(kane: i64) -> Option<KanePackage> {
    KANE_PACKAGES.iter().copied().find(|p| p.kane == kane)
}

/// Sum of ledger amounts applied in creation order from zero.
/// Accepts entries in any order; only the sum matters.
pub fn replay(transactions: &[CurrencyTransaction]) -> i64 {
    transactions.iter().map(|t| t.amount).sum()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    pub balance: i64,
    pub transactions: Vec<CurrencyTransaction>,
}

pub struct KaneWallet {
    profiles: Arc<dyn ProfileStore>,
    ledger: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
}

impl KaneWallet {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        ledger: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            ledger,
            clock,
        }
    }

    /// Credit a purchased package.
    pub fn purchase(&self, user_id: &str, kane: i64) -> Result<CurrencyTransaction, CoreError> {
        let package = find_package(kane).ok_or(ValidationError::UnknownPackage(kane))?;
        let tx = self
            .ledger
            .insert_transaction(user_id, package.kane, TxReason::Purchase, self.clock.now())
            .map_err(|e| match e {
                StoreError::NotFound { .. } => CoreError::ProfileNotFound(user_id.to_string()),
                other => CoreError::TransactionPersistence(other),
            })?;
        info!(user = user_id, kane = package.kane, price_won = package.price_won, "Kane purchased");
        Ok(tx)
    }

    /// Current balance and the latest ledger entries, newest first.
    pub fn history(&self, user_id: &str, limit: Option<u32>) -> Result<WalletSummary, CoreError> {
        let profile = self
            .profiles
            .get_profile(user_id)?
            .ok_or_else(|| CoreError::ProfileNotFound(user_id.to_string()))?;
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let transactions = self.ledger.list_transactions(user_id, limit)?;
        Ok(WalletSummary {
            balance: profile.balance,
            transactions,
        })
    }

    /// Whether the cached balance equals the replayed ledger.
    pub fn audit(&self, user_id: &str) -> Result<bool, CoreError> {
        let profile = self
            .profiles
            .get_profile(user_id)?
            .ok_or_else(|| CoreError::ProfileNotFound(user_id.to_string()))?;
        let all = self.ledger.list_transactions(user_id, u32::MAX)?;
        let replayed = replay(&all);
        if replayed != profile.balance {
            warn!(user = user_id, cached = profile.balance, replayed, "Kane ledger out of sync");
        }
        Ok(replayed == profile.balance)
    }
}
