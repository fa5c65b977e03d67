// Copyright (c) 2026 memograde developers. Licensed under MIT.
use std::sync::Arc;
use std::time::Duration;

use memograde::config::ServiceConfig;
use memograde::flows::GradingService;
use memograde::ledger::horizon::HorizonLedger;
use memograde::server::build_router;
use memograde::telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    telemetry::init_telemetry();

    let cfg = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(ledger = %cfg.ledger_url, issuer = %cfg.issuer_public, "starting memograde");

    let ledger = match HorizonLedger::new(&cfg.ledger_url, Duration::from_secs(cfg.ledger_timeout_secs)) {
        Ok(ledger) => Arc::new(ledger),
        Err(e) => {
            tracing::error!("ledger client init failed: {e}");
            std::process::exit(1);
        }
    };

    let auth_token = cfg.auth_token.clone();
    let addr = cfg.bind_addr;
    let service = match GradingService::new(cfg, ledger) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("service init failed: {e}");
            std::process::exit(1);
        }
    };

    let app = build_router(service, auth_token);

    tracing::info!("listening on {addr}");
    let listener = TcpListener::bind(addr).await.expect("bind failed");
    axum::serve(listener, app).await.expect("server error");
}
