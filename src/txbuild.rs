// Copyright (c) 2026 memograde developers. Licensed under MIT.
//! Transaction drafting and envelope signing.
//!
//! A draft is an ordered operation bundle plus sequencing metadata; the
//! ledger applies it atomically or not at all. Signing follows the usual
//! network-id scheme: signatures cover `sha256(sha256(passphrase) || tx)`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Minimum per-operation fee, in stroops.
pub const MIN_BASE_FEE: u32 = 100;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("bad signing key: {0}")]
    BadKey(String),
    #[error("invalid operation bundle: {0}")]
    BadBundle(String),
    #[error("envelope encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    Native,
    Credit { code: String, issuer: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Issuer starts sponsoring the subject's reserve requirements.
    BeginSponsoring { sponsored: String },
    /// Trust line for the reward asset, running under the trustor's account
    /// (the trustor must co-sign the envelope).
    ChangeTrust {
        trustor: String,
        asset: Asset,
        limit: String,
    },
    EndSponsoring { source: String },
    Payment {
        destination: String,
        asset: Asset,
        amount: String,
    },
}

impl Operation {
    /// Ledger-native operation type name, as reported in histories.
    pub fn type_name(&self) -> &'static str {
        match self {
            Operation::BeginSponsoring { .. } => "begin_sponsoring_future_reserves",
            Operation::ChangeTrust { .. } => "change_trust",
            Operation::EndSponsoring { .. } => "end_sponsoring_future_reserves",
            Operation::Payment { .. } => "payment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub source: String,
    pub sequence: i64,
    pub fee: u32,
    /// Validity window in seconds from submission.
    pub timeout_secs: u64,
    pub memo: String,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub tx: TransactionDraft,
    /// base64 ed25519 signatures, one per required signer.
    pub signatures: Vec<String>,
}

/// Checks the structural rules the ledger enforces on sponsorship blocks,
/// so a bad bundle fails locally instead of burning a sequence number:
/// begin/end must pair up and a payment may not sit inside an open block.
pub fn validate_bundle(operations: &[Operation]) -> Result<(), TxError> {
    if operations.is_empty() {
        return Err(TxError::BadBundle("no operations".to_string()));
    }
    let mut sponsoring = false;
    for op in operations {
        match op {
            Operation::BeginSponsoring { .. } => {
                if sponsoring {
                    return Err(TxError::BadBundle("nested sponsorship".to_string()));
                }
                sponsoring = true;
            }
            Operation::EndSponsoring { .. } => {
                if !sponsoring {
                    return Err(TxError::BadBundle("end without begin".to_string()));
                }
                sponsoring = false;
            }
            Operation::Payment { .. } => {
                if sponsoring {
                    return Err(TxError::BadBundle(
                        "payment inside sponsorship block".to_string(),
                    ));
                }
            }
            Operation::ChangeTrust { .. } => {}
        }
    }
    if sponsoring {
        return Err(TxError::BadBundle("unclosed sponsorship block".to_string()));
    }
    Ok(())
}

/// Parses a signing seed given as 64 hex chars or standard base64.
pub fn parse_signing_key(seed: &str) -> Result<SigningKey, TxError> {
    let bytes = if seed.len() == SECRET_KEY_LENGTH * 2 {
        hex::decode(seed).map_err(|e| TxError::BadKey(e.to_string()))?
    } else {
        BASE64
            .decode(seed)
            .map_err(|e| TxError::BadKey(e.to_string()))?
    };
    let bytes: [u8; SECRET_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| TxError::BadKey("seed must be 32 bytes".to_string()))?;
    Ok(SigningKey::from_bytes(&bytes))
}

fn signing_hash(draft: &TransactionDraft, network_passphrase: &str) -> Result<[u8; 32], TxError> {
    let network_id = Sha256::digest(network_passphrase.as_bytes());
    let tx_bytes = serde_json::to_vec(draft).map_err(|e| TxError::Encode(e.to_string()))?;
    let mut payload = Vec::with_capacity(network_id.len() + tx_bytes.len());
    payload.extend_from_slice(&network_id);
    payload.extend_from_slice(&tx_bytes);
    Ok(Sha256::digest(&payload).into())
}

/// Signs the draft with every supplied key, validating the bundle first.
pub fn sign(
    draft: TransactionDraft,
    network_passphrase: &str,
    keys: &[&SigningKey],
) -> Result<SignedEnvelope, TxError> {
    validate_bundle(&draft.operations)?;
    let hash = signing_hash(&draft, network_passphrase)?;
    let signatures = keys
        .iter()
        .map(|key| BASE64.encode(key.sign(&hash).to_bytes()))
        .collect();
    Ok(SignedEnvelope {
        tx: draft,
        signatures,
    })
}

/// Checks whether any signature on the envelope verifies under `key`.
pub fn verify_signer(
    envelope: &SignedEnvelope,
    network_passphrase: &str,
    key: &VerifyingKey,
) -> Result<bool, TxError> {
    let hash = signing_hash(&envelope.tx, network_passphrase)?;
    for sig in &envelope.signatures {
        let bytes = BASE64.decode(sig).map_err(|e| TxError::Encode(e.to_string()))?;
        let bytes: [u8; 64] = match bytes.try_into() {
            Ok(b) => b,
            Err(_) => continue,
        };
        if key.verify(&hash, &Signature::from_bytes(&bytes)).is_ok() {
            return Ok(true);
        }
    }
    Ok(false)
}
