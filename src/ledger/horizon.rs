// Copyright (c) 2026 memograde developers. Licensed under MIT.
//! reqwest implementation of the [`Ledger`] trait against a Horizon-style
//! REST surface. Every call carries the client-wide timeout; a timeout or
//! connect failure surfaces as `LedgerError::Unavailable`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{AccountState, AssetBalance, Ledger, LedgerError, OperationRecord, SubmitResult, TransactionRecord};
use crate::txbuild::SignedEnvelope;

const PAGE_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct HorizonLedger {
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct RawBalance {
    #[serde(default)]
    asset_code: Option<String>,
    #[serde(default)]
    asset_issuer: Option<String>,
    balance: String,
}

#[derive(Deserialize)]
struct RawAccount {
    id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<RawBalance>,
}

#[derive(Deserialize)]
struct RawTransaction {
    id: String,
    paging_token: String,
    #[serde(default)]
    memo: Option<String>,
}

#[derive(Deserialize)]
struct RawOperation {
    id: String,
    paging_token: String,
    #[serde(rename = "type")]
    type_name: String,
    transaction_hash: String,
}

#[derive(Deserialize)]
struct Page<T> {
    _embedded: Embedded<T>,
}

#[derive(Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

/// History records carry a cursor the next page request resumes from.
trait PagedRecord {
    fn paging_token(&self) -> &str;
}

impl PagedRecord for RawTransaction {
    fn paging_token(&self) -> &str {
        &self.paging_token
    }
}

impl PagedRecord for RawOperation {
    fn paging_token(&self) -> &str {
        &self.paging_token
    }
}

#[derive(Deserialize)]
struct SubmitOk {
    hash: String,
}

#[derive(Deserialize)]
struct ProblemBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

fn transport_err(e: reqwest::Error) -> LedgerError {
    LedgerError::Unavailable(e.to_string())
}

impl HorizonLedger {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_err)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        cursor: Option<&str>,
    ) -> Result<Vec<T>, LedgerError> {
        let mut url = format!(
            "{}{}?limit={}&order=asc",
            self.base_url, path, PAGE_LIMIT
        );
        if let Some(c) = cursor {
            url.push_str("&cursor=");
            url.push_str(c);
        }
        let resp = self.client.get(&url).send().await.map_err(transport_err)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(LedgerError::NotFound),
            s if s.is_success() => {
                let page: Page<T> = resp.json().await.map_err(transport_err)?;
                Ok(page._embedded.records)
            }
            s => Err(LedgerError::Unavailable(format!("query failed: {s}"))),
        }
    }

    /// Follows paging cursors until a short page signals the end of the
    /// collection.
    async fn collect_pages<T>(&self, path: &str) -> Result<Vec<T>, LedgerError>
    where
        T: serde::de::DeserializeOwned + PagedRecord,
    {
        let mut out: Vec<T> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let records: Vec<T> = self.get_page(path, cursor.as_deref()).await?;
            let short_page = records.len() < PAGE_LIMIT;
            cursor = records.last().map(|r| r.paging_token().to_string());
            out.extend(records);
            if short_page {
                return Ok(out);
            }
        }
    }
}

#[async_trait]
impl Ledger for HorizonLedger {
    async fn get_account(&self, id: &str) -> Result<AccountState, LedgerError> {
        let url = format!("{}/accounts/{}", self.base_url, id);
        let resp = self.client.get(&url).send().await.map_err(transport_err)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(LedgerError::NotFound),
            s if s.is_success() => {
                let raw: RawAccount = resp.json().await.map_err(transport_err)?;
                let sequence = raw
                    .sequence
                    .parse::<i64>()
                    .map_err(|e| LedgerError::Unavailable(format!("bad sequence: {e}")))?;
                let balances = raw
                    .balances
                    .into_iter()
                    .filter_map(|b| match (b.asset_code, b.asset_issuer) {
                        // Native balances carry no code/issuer pair.
                        (Some(code), Some(issuer)) => Some(AssetBalance {
                            asset_code: code,
                            asset_issuer: issuer,
                            balance: b.balance,
                        }),
                        _ => None,
                    })
                    .collect();
                Ok(AccountState {
                    id: raw.id,
                    sequence,
                    balances,
                })
            }
            s => Err(LedgerError::Unavailable(format!("account query failed: {s}"))),
        }
    }

    async fn get_transactions(&self, id: &str) -> Result<Vec<TransactionRecord>, LedgerError> {
        let transactions: Vec<RawTransaction> = self
            .collect_pages(&format!("/accounts/{id}/transactions"))
            .await?;
        let operations: Vec<RawOperation> = self
            .collect_pages(&format!("/accounts/{id}/operations"))
            .await?;

        let mut by_tx: HashMap<String, Vec<OperationRecord>> = HashMap::new();
        for op in operations {
            by_tx.entry(op.transaction_hash).or_default().push(OperationRecord {
                id: op.id,
                type_name: op.type_name,
            });
        }

        Ok(transactions
            .into_iter()
            .map(|tx| {
                let operations = by_tx.remove(&tx.id).unwrap_or_default();
                TransactionRecord {
                    id: tx.id,
                    memo: tx.memo,
                    operations,
                }
            })
            .collect())
    }

    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitResult, LedgerError> {
        let url = format!("{}/transactions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(envelope)
            .send()
            .await
            .map_err(transport_err)?;

        let status = resp.status();
        if status.is_success() {
            let ok: SubmitOk = resp.json().await.map_err(transport_err)?;
            return Ok(SubmitResult { hash: ok.hash });
        }

        // Rate limiting and server-side outages are retryable; everything
        // else means the ledger looked at the envelope and said no.
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(LedgerError::Unavailable(format!("submit failed: {status}")));
        }
        let cause = match resp.json::<ProblemBody>().await {
            Ok(body) => body
                .detail
                .or(body.title)
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };
        Err(LedgerError::Rejected(cause))
    }
}
