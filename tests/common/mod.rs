//! In-memory ledger double. Applies envelope effects atomically: the whole
//! bundle validates first, then either every effect lands or none does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use memograde::config::ServiceConfig;
use memograde::ledger::{
    AccountState, AssetBalance, Ledger, LedgerError, OperationRecord, SubmitResult,
    TransactionRecord,
};
use memograde::txbuild::{Operation, SignedEnvelope};

pub const ISSUER: &str = "ISSUER";
pub const SUBJECT: &str = "SUBJPUB";

pub fn issuer_seed() -> String {
    hex::encode([1u8; 32])
}

pub fn subject_seed() -> String {
    hex::encode([2u8; 32])
}

pub fn test_config() -> ServiceConfig {
    let mut cfg = ServiceConfig::default();
    cfg.issuer_public = ISSUER.to_string();
    cfg.issuer_secret = issuer_seed();
    cfg
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<String, AccountState>,
    history: HashMap<String, Vec<TransactionRecord>>,
    next_tx: u64,
}

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
    pub submit_count: AtomicUsize,
    /// Next submission is refused by the ledger (validated, rejected).
    pub reject_next: AtomicBool,
    /// Transport failure mode for every call.
    pub unavailable: AtomicBool,
    pub last_envelope: Mutex<Option<SignedEnvelope>>,
}

impl MockLedger {
    pub fn with_accounts() -> Self {
        let ledger = Self::default();
        {
            let mut state = ledger.state.lock().unwrap();
            for id in [ISSUER, SUBJECT] {
                state.accounts.insert(
                    id.to_string(),
                    AccountState {
                        id: id.to_string(),
                        sequence: 100,
                        balances: Vec::new(),
                    },
                );
            }
        }
        ledger
    }

    pub fn memos_of(&self, account: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .history
            .get(account)
            .map(|txs| txs.iter().filter_map(|tx| tx.memo.clone()).collect())
            .unwrap_or_default()
    }

    pub fn trustline_count(&self, account: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .accounts
            .get(account)
            .map(|a| a.balances.len())
            .unwrap_or(0)
    }

    fn check_transport(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_account(&self, id: &str) -> Result<AccountState, LedgerError> {
        self.check_transport()?;
        let state = self.state.lock().unwrap();
        state.accounts.get(id).cloned().ok_or(LedgerError::NotFound)
    }

    async fn get_transactions(&self, id: &str) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.check_transport()?;
        let state = self.state.lock().unwrap();
        if !state.accounts.contains_key(id) {
            return Err(LedgerError::NotFound);
        }
        Ok(state.history.get(id).cloned().unwrap_or_default())
    }

    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitResult, LedgerError> {
        self.check_transport()?;
        *self.last_envelope.lock().unwrap() = Some(envelope.clone());

        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Rejected("op_malformed".to_string()));
        }

        let mut state = self.state.lock().unwrap();

        // Validate the whole bundle before touching anything.
        {
            let source = state
                .accounts
                .get(&envelope.tx.source)
                .ok_or(LedgerError::NotFound)?;
            if envelope.tx.sequence != source.sequence + 1 {
                return Err(LedgerError::Rejected("tx_bad_seq".to_string()));
            }
            for op in &envelope.tx.operations {
                let target = match op {
                    Operation::ChangeTrust { trustor, .. } => trustor,
                    Operation::Payment { destination, .. } => destination,
                    Operation::BeginSponsoring { sponsored } => sponsored,
                    Operation::EndSponsoring { source } => source,
                };
                if !state.accounts.contains_key(target) {
                    return Err(LedgerError::Rejected("op_no_destination".to_string()));
                }
            }
        }

        // All valid: apply effects.
        state.next_tx += 1;
        let tx_id = format!("tx{:04}", state.next_tx);
        for op in &envelope.tx.operations {
            if let Operation::ChangeTrust { trustor, asset, .. } = op {
                if let memograde::txbuild::Asset::Credit { code, issuer } = asset {
                    let account = state.accounts.get_mut(trustor).unwrap();
                    account.balances.push(AssetBalance {
                        asset_code: code.clone(),
                        asset_issuer: issuer.clone(),
                        balance: "0".to_string(),
                    });
                }
            }
        }
        let operations = envelope
            .tx
            .operations
            .iter()
            .enumerate()
            .map(|(i, op)| OperationRecord {
                id: format!("{tx_id}-op{i}"),
                type_name: op.type_name().to_string(),
            })
            .collect();
        let record = TransactionRecord {
            id: tx_id.clone(),
            memo: Some(envelope.tx.memo.clone()),
            operations,
        };
        state
            .history
            .entry(envelope.tx.source.clone())
            .or_default()
            .push(record);
        state
            .accounts
            .get_mut(&envelope.tx.source)
            .unwrap()
            .sequence += 1;

        self.submit_count.fetch_add(1, Ordering::SeqCst);
        Ok(SubmitResult { hash: tx_id })
    }
}
