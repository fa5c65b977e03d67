// Copyright (c) 2026 memograde developers. Licensed under MIT.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::FlowResponse;
use crate::ledger::LedgerError;

/// Everything a flow can fail with. Every variant maps to the uniform
/// `{status, transactionHash, errorLog}` envelope; nothing here aborts the
/// process.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("account not found on the ledger")]
    AccountNotFound,
    #[error("account is already authorized")]
    AlreadyAuthorized,
    #[error("no authorization recorded for this identity")]
    Unauthorized,
    #[error("no submission recorded for this code")]
    CodeMismatch,
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("ledger rejected the transaction: {0}")]
    LedgerRejected(String),
    #[error("internal error")]
    Internal,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::AccountNotFound => StatusCode::NOT_FOUND,
            ServiceError::AlreadyAuthorized => StatusCode::CONFLICT,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::CodeMismatch => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::LedgerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::LedgerRejected(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound => ServiceError::AccountNotFound,
            LedgerError::Unavailable(msg) => {
                metrics::counter!("memograde_ledger_unavailable_total", 1);
                ServiceError::LedgerUnavailable(msg)
            }
            LedgerError::Rejected(msg) => {
                metrics::counter!("memograde_ledger_rejected_total", 1);
                ServiceError::LedgerRejected(msg)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(%status, error = %self, "flow failed");
        let body = Json(FlowResponse {
            status: "Fail".to_string(),
            transaction_hash: String::new(),
            error_log: self.to_string(),
        });
        (status, body).into_response()
    }
}
