// Copyright (c) 2026 memograde developers. Licensed under MIT.
pub mod api;
pub mod config;
pub mod errors;
pub mod flows;
pub mod ledger;
pub mod memo;
pub mod server;
pub mod telemetry;
pub mod token;
pub mod txbuild;
