// Copyright (c) 2026 memograde developers. Licensed under MIT.
//! Flow orchestration: authorization, code submission, code check, and the
//! history read path. Each flow runs to completion within its request; the
//! external ledger is the only source of truth. Submitting flows serialize
//! on `issuer_lock` so issuer sequence numbers never race and the
//! duplicate check is re-validated right before submission.

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use tokio::sync::Mutex;

use crate::api::{
    AuthorizationRequest, CheckRequest, FlowResponse, OperationSummary, SubmitRequest,
    TransactionSummary,
};
use crate::config::ServiceConfig;
use crate::errors::ServiceError;
use crate::ledger::{Ledger, LedgerError};
use crate::memo;
use crate::token;
use crate::txbuild::{self, Asset, Operation, TransactionDraft, TxError, MIN_BASE_FEE};

pub struct GradingService {
    cfg: ServiceConfig,
    ledger: Arc<dyn Ledger>,
    issuer_key: SigningKey,
    issuer_lock: Mutex<()>,
}

fn require(value: &str, name: &str) -> Result<(), ServiceError> {
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

fn tx_err(e: TxError) -> ServiceError {
    match e {
        TxError::BadKey(msg) => ServiceError::Validation(format!("bad key: {msg}")),
        TxError::BadBundle(msg) | TxError::Encode(msg) => {
            tracing::error!(%msg, "envelope construction failed");
            ServiceError::Internal
        }
    }
}

impl GradingService {
    pub fn new(cfg: ServiceConfig, ledger: Arc<dyn Ledger>) -> Result<Self, ServiceError> {
        let issuer_key = txbuild::parse_signing_key(&cfg.issuer_secret).map_err(tx_err)?;
        Ok(Self {
            cfg,
            ledger,
            issuer_key,
            issuer_lock: Mutex::new(()),
        })
    }

    fn reward_asset(&self) -> Asset {
        Asset::Credit {
            code: self.cfg.reward_asset_code.clone(),
            issuer: self.cfg.issuer_public.clone(),
        }
    }

    /// Memo history of the issuing account, the protocol's verification
    /// store. A missing issuer account is an environment fault, not an
    /// absent token.
    async fn issuer_memos(&self) -> Result<Vec<String>, ServiceError> {
        match memo::fetch_memos(self.ledger.as_ref(), &self.cfg.issuer_public).await {
            Ok(memos) => Ok(memos),
            Err(LedgerError::NotFound) => Err(ServiceError::LedgerUnavailable(
                "issuing account missing from ledger".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn issuer_sequence(&self) -> Result<i64, ServiceError> {
        match self.ledger.get_account(&self.cfg.issuer_public).await {
            Ok(account) => Ok(account.sequence),
            Err(LedgerError::NotFound) => Err(ServiceError::LedgerUnavailable(
                "issuing account missing from ledger".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Authorization: at most once per subject account. Sponsorship must
    /// bracket the trust line exactly, and the reward payment rides in the
    /// same atomic bundle.
    pub async fn authorize(&self, req: &AuthorizationRequest) -> Result<FlowResponse, ServiceError> {
        require(&req.public_key, "publicKey")?;
        require(&req.student_id, "studentId")?;
        require(&req.pin, "pin")?;

        let subject_key = match &req.secret_key {
            Some(seed) => Some(txbuild::parse_signing_key(seed).map_err(tx_err)?),
            None => None,
        };

        let auth_token = token::derive_auth_token(&req.student_id, &req.pin, &req.public_key);

        // First pass outside the lock gives early failures; both checks run
        // again under the lock since check-then-act is a race window.
        let subject = self.ledger.get_account(&req.public_key).await?;
        if subject.has_trustline(&self.cfg.reward_asset_code, &self.cfg.issuer_public) {
            return Err(ServiceError::AlreadyAuthorized);
        }

        let _guard = self.issuer_lock.lock().await;

        let subject = self.ledger.get_account(&req.public_key).await?;
        if subject.has_trustline(&self.cfg.reward_asset_code, &self.cfg.issuer_public) {
            return Err(ServiceError::AlreadyAuthorized);
        }
        if memo::contains(&auth_token, &self.issuer_memos().await?) {
            return Err(ServiceError::AlreadyAuthorized);
        }

        let sequence = self.issuer_sequence().await?;

        let (operations, signers): (Vec<Operation>, Vec<&SigningKey>) = match &subject_key {
            Some(subject_signer) => (
                vec![
                    Operation::BeginSponsoring {
                        sponsored: req.public_key.clone(),
                    },
                    Operation::ChangeTrust {
                        trustor: req.public_key.clone(),
                        asset: self.reward_asset(),
                        limit: "922337203685.4775807".to_string(),
                    },
                    Operation::EndSponsoring {
                        source: req.public_key.clone(),
                    },
                    Operation::Payment {
                        destination: req.public_key.clone(),
                        asset: self.reward_asset(),
                        amount: self.cfg.auth_reward_amount.clone(),
                    },
                ],
                vec![&self.issuer_key, subject_signer],
            ),
            // Prototype variant: no subject signature available, so no
            // trust line; the reward is a native payment and at-most-once
            // rests on the memo check alone.
            None => (
                vec![Operation::Payment {
                    destination: req.public_key.clone(),
                    asset: Asset::Native,
                    amount: self.cfg.auth_reward_amount.clone(),
                }],
                vec![&self.issuer_key],
            ),
        };

        let draft = TransactionDraft {
            source: self.cfg.issuer_public.clone(),
            sequence: sequence + 1,
            fee: MIN_BASE_FEE * operations.len() as u32,
            timeout_secs: self.cfg.tx_timeout_secs,
            memo: auth_token,
            operations,
        };
        let envelope =
            txbuild::sign(draft, &self.cfg.network_passphrase, &signers).map_err(tx_err)?;

        // One-shot: a rejection comes back to the caller as-is, no retry.
        let result = self.ledger.submit(&envelope).await?;
        metrics::counter!("memograde_authorizations_total", 1);
        tracing::info!(subject = %req.public_key, hash = %result.hash, "authorization recorded");
        Ok(FlowResponse::ok(result.hash))
    }

    /// Code submission: gated on an observed authorization memo, then
    /// records the submission token in a fresh memo.
    pub async fn submit_code(&self, req: &SubmitRequest) -> Result<FlowResponse, ServiceError> {
        require(&req.public_key, "publicKey")?;
        require(&req.student_id, "studentId")?;
        require(&req.pin, "pin")?;
        require(&req.code, "code")?;

        let auth_token = token::derive_auth_token(&req.student_id, &req.pin, &req.public_key);
        if !memo::contains(&auth_token, &self.issuer_memos().await?) {
            return Err(ServiceError::Unauthorized);
        }
        let submission_token = token::derive_submission_token(&auth_token, &req.code);

        let _guard = self.issuer_lock.lock().await;

        let sequence = self.issuer_sequence().await?;
        let draft = TransactionDraft {
            source: self.cfg.issuer_public.clone(),
            sequence: sequence + 1,
            fee: MIN_BASE_FEE,
            timeout_secs: self.cfg.tx_timeout_secs,
            memo: submission_token,
            operations: vec![Operation::Payment {
                destination: req.public_key.clone(),
                asset: self.reward_asset(),
                amount: self.cfg.submit_amount.clone(),
            }],
        };
        let envelope =
            txbuild::sign(draft, &self.cfg.network_passphrase, &[&self.issuer_key]).map_err(tx_err)?;

        let result = self.ledger.submit(&envelope).await?;
        metrics::counter!("memograde_submissions_total", 1);
        tracing::info!(subject = %req.public_key, hash = %result.hash, "code submission recorded");
        Ok(FlowResponse::ok(result.hash))
    }

    /// Pure verification, no ledger write. Idempotent and safe to retry.
    pub async fn check_code(&self, req: &CheckRequest) -> Result<FlowResponse, ServiceError> {
        require(&req.public_key, "publicKey")?;
        require(&req.student_id, "studentId")?;
        require(&req.pin, "pin")?;

        let auth_token = token::derive_auth_token(&req.student_id, &req.pin, &req.public_key);
        let memos = self.issuer_memos().await?;
        if !memo::contains(&auth_token, &memos) {
            return Err(ServiceError::Unauthorized);
        }
        // Empty code checks the authorization memo alone.
        if !req.code.is_empty() {
            let submission_token = token::derive_submission_token(&auth_token, &req.code);
            if !memo::contains(&submission_token, &memos) {
                return Err(ServiceError::CodeMismatch);
            }
        }
        metrics::counter!("memograde_checks_total", 1);
        Ok(FlowResponse::ok(""))
    }

    /// Transaction/operation history of an account, as the ledger reports it.
    pub async fn history(&self, public_key: &str) -> Result<Vec<TransactionSummary>, ServiceError> {
        require(public_key, "pub_key")?;
        let transactions = self.ledger.get_transactions(public_key).await?;
        Ok(transactions
            .into_iter()
            .map(|tx| TransactionSummary {
                transaction_id: tx.id,
                operations: tx
                    .operations
                    .into_iter()
                    .map(|op| OperationSummary {
                        operation_id: op.id,
                        type_name: op.type_name,
                    })
                    .collect(),
            })
            .collect())
    }
}
