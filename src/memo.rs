// Copyright (c) 2026 memograde developers. Licensed under MIT.
//! Memo ledger reader and matcher. The ordered collection of memo strings
//! on the issuing account is the protocol's verification store: a token is
//! proven if and only if its truncated text equals one of them.

use crate::ledger::{Ledger, LedgerError};

/// Collects every memo recorded on `account_id`, ledger-native order.
pub async fn fetch_memos(ledger: &dyn Ledger, account_id: &str) -> Result<Vec<String>, LedgerError> {
    let transactions = ledger.get_transactions(account_id).await?;
    Ok(transactions.into_iter().filter_map(|tx| tx.memo).collect())
}

/// Exact string equality against the fetched sequence. No fuzzy matching;
/// correctness hinges on both sides truncating to `MEMO_TEXT_MAX`.
pub fn contains(token: &str, memos: &[String]) -> bool {
    memos.iter().any(|m| m == token)
}
