// Copyright (c) 2026 memograde developers. Licensed under MIT.
use std::net::SocketAddr;
use thiserror::Error;

/// Runtime configuration. Issuer key material is injected here instead of
/// living in process-wide constants; `issuer_secret` has no default and
/// must come from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// Base URL of the ledger's HTTP query/submission endpoint.
    pub ledger_url: String,
    /// Network passphrase mixed into every signing payload.
    pub network_passphrase: String,
    /// Account the service issues rewards and records memos from.
    pub issuer_public: String,
    /// Signing seed for `issuer_public`, hex or base64.
    pub issuer_secret: String,
    pub reward_asset_code: String,
    pub auth_reward_amount: String,
    pub submit_amount: String,
    pub ledger_timeout_secs: u64,
    /// Transaction validity window in seconds.
    pub tx_timeout_secs: u64,
    /// Optional bearer token guarding the HTTP surface.
    pub auth_token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            ledger_url: "https://horizon-testnet.stellar.org".to_string(),
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            issuer_public: String::new(),
            issuer_secret: String::new(),
            reward_asset_code: "GRADE".to_string(),
            auth_reward_amount: "1".to_string(),
            submit_amount: "0.00001".to_string(),
            ledger_timeout_secs: 10,
            tx_timeout_secs: 100,
            auth_token: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

fn var(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl ServiceConfig {
    /// Loads config from `MEMOGRADE_*` environment variables on top of the
    /// defaults. The issuer key pair is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(addr) = var("MEMOGRADE_BIND_ADDR") {
            cfg.bind_addr = addr
                .parse()
                .map_err(|e| ConfigError::Invalid("MEMOGRADE_BIND_ADDR", format!("{e}")))?;
        }
        if let Some(url) = var("MEMOGRADE_LEDGER_URL") {
            cfg.ledger_url = url;
        }
        if let Some(p) = var("MEMOGRADE_NETWORK_PASSPHRASE") {
            cfg.network_passphrase = p;
        }
        if let Some(code) = var("MEMOGRADE_REWARD_ASSET") {
            cfg.reward_asset_code = code;
        }
        if let Some(amount) = var("MEMOGRADE_AUTH_REWARD_AMOUNT") {
            cfg.auth_reward_amount = amount;
        }
        if let Some(amount) = var("MEMOGRADE_SUBMIT_AMOUNT") {
            cfg.submit_amount = amount;
        }
        if let Some(secs) = var("MEMOGRADE_LEDGER_TIMEOUT_SECS") {
            cfg.ledger_timeout_secs = secs
                .parse()
                .map_err(|e| ConfigError::Invalid("MEMOGRADE_LEDGER_TIMEOUT_SECS", format!("{e}")))?;
        }
        cfg.auth_token = var("MEMOGRADE_AUTH_TOKEN");

        cfg.issuer_public =
            var("MEMOGRADE_ISSUER_PUBLIC").ok_or(ConfigError::Missing("MEMOGRADE_ISSUER_PUBLIC"))?;
        cfg.issuer_secret =
            var("MEMOGRADE_ISSUER_SECRET").ok_or(ConfigError::Missing("MEMOGRADE_ISSUER_SECRET"))?;

        Ok(cfg)
    }
}
