// Copyright (c) 2026 memograde developers. Licensed under MIT.
//! Narrow interface to the external ledger. The ledger owns all durable
//! state; this service only reads account/transaction views and submits
//! signed envelopes.

pub mod horizon;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::txbuild::SignedEnvelope;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    /// The queried account does not exist.
    #[error("not found")]
    NotFound,
    /// Transport-level failure (timeout, connect error, rate limit). The
    /// caller may retry; it must never be read as "token absent".
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// The ledger validated and refused the envelope. Fatal for this
    /// attempt; resubmitting the same envelope cannot succeed.
    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset_code: String,
    pub asset_issuer: String,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    pub id: String,
    pub sequence: i64,
    #[serde(default)]
    pub balances: Vec<AssetBalance>,
}

impl AccountState {
    /// Whether the account already holds a trust line for `code` issued by
    /// `issuer`. This is the at-most-once authorization check.
    pub fn has_trustline(&self, code: &str, issuer: &str) -> bool {
        self.balances
            .iter()
            .any(|b| b.asset_code == code && b.asset_issuer == issuer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: String,
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub memo: Option<String>,
    #[serde(default)]
    pub operations: Vec<OperationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResult {
    pub hash: String,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_account(&self, id: &str) -> Result<AccountState, LedgerError>;

    /// Full transaction history of an account, ledger-native order.
    /// Matching is existence-based so the order never affects correctness.
    async fn get_transactions(&self, id: &str) -> Result<Vec<TransactionRecord>, LedgerError>;

    /// One-shot submission. No retry happens at this layer or above.
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitResult, LedgerError>;
}
