// Copyright (c) 2026 memograde developers. Licensed under MIT.
//! Token derivation.
//!
//! Both token kinds are SHA-256 digests over a fixed concatenation of
//! identity fields, base64-encoded and truncated to the ledger's memo-text
//! capacity. The concatenation order and the truncation length are protocol
//! constants: changing either breaks verification against every token
//! already recorded on the ledger.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

/// Memo-text capacity of the ledger. A 32-byte digest encodes to 44 base64
/// characters; only the first `MEMO_TEXT_MAX` fit in a memo, so the
/// truncated text is the canonical token value everywhere in the protocol.
pub const MEMO_TEXT_MAX: usize = 28;

fn digest_memo(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    let mut text = BASE64.encode(digest);
    text.truncate(MEMO_TEXT_MAX);
    text
}

/// Derives the authorization token for an identity tuple.
///
/// Layout: `sha256(studentId || pin || publicKey)`, no separators.
pub fn derive_auth_token(student_id: &str, pin: &str, public_key: &str) -> String {
    let mut input = Vec::with_capacity(student_id.len() + pin.len() + public_key.len());
    input.extend_from_slice(student_id.as_bytes());
    input.extend_from_slice(pin.as_bytes());
    input.extend_from_slice(public_key.as_bytes());
    digest_memo(&input)
}

/// Derives the submission token proving that `code` was turned in.
///
/// The input is the truncated authorization token text, not the full
/// digest, so a verifier can re-derive everything from values that are
/// public on the ledger.
pub fn derive_submission_token(auth_token: &str, code: &str) -> String {
    let mut input = Vec::with_capacity(auth_token.len() + code.len());
    input.extend_from_slice(auth_token.as_bytes());
    input.extend_from_slice(code.as_bytes());
    digest_memo(&input)
}
