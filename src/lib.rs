//! Metalayer indexer
//!
//! Derives a deterministic token ledger from metadata payloads embedded in
//! host-chain transactions.
//!
//! - `config`: environment configuration and per-network consensus parameters
//! - `domain`: models, the payload codec and the per-component state machines
//! - `application`: the consensus engine and the block-following indexer
//! - `infrastructure`: block sources, snapshot persistence and the HTTP API
//! - `utils`: logging helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod utils;
