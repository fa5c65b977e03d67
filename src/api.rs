// Copyright (c) 2026 memograde developers. Licensed under MIT.
//! Wire types for the HTTP surface. Field names follow the grading
//! client's contract, hence the camelCase renames.

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub public_key: String,
    pub student_id: String,
    pub pin: String,
    /// Subject signing seed. When present the flow establishes a sponsored
    /// reward trust line, which the subject must co-sign; when absent only
    /// a native payment is made.
    #[serde(default)]
    pub secret_key: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub public_key: String,
    pub student_id: String,
    pub pin: String,
    pub code: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub public_key: String,
    pub student_id: String,
    pub pin: String,
    pub code: String,
}

/// Uniform envelope returned by every flow, success or failure.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse {
    pub status: String,
    pub transaction_hash: String,
    pub error_log: String,
}

impl FlowResponse {
    pub fn ok(transaction_hash: impl Into<String>) -> Self {
        Self {
            status: "OK".to_string(),
            transaction_hash: transaction_hash.into(),
            error_log: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TransactionSummary {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    pub operations: Vec<OperationSummary>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct OperationSummary {
    #[serde(rename = "operationID")]
    pub operation_id: String,
    #[serde(rename = "type")]
    pub type_name: String,
}
