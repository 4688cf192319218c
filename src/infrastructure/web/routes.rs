// Route definitions for the query API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use crate::application::engine::EngineQueries;
use crate::infrastructure::chain::LocalChain;

/// Application state shared with handlers
#[derive(Clone)]
pub struct AppState {
    pub queries: EngineQueries,
    /// Present only when blocks come from the in-process chain
    pub local_chain: Option<Arc<LocalChain>>,
    pub source_name: String,
    pub network: String,
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health_check))
        .route("/api/status", get(handlers::get_status))
        .route(
            "/api/balances/{address}/{property}",
            get(handlers::get_balance),
        )
        .route("/api/balances/{address}", get(handlers::get_balances))
        .route("/api/properties", get(handlers::list_properties))
        .route("/api/properties/{id}", get(handlers::get_property))
        .route("/api/crowdsales/active", get(handlers::active_crowdsales))
        .route("/api/crowdsales/{id}", get(handlers::get_crowdsale))
        .route("/api/dex/offers", get(handlers::active_offers))
        .route(
            "/api/transactions/raw",
            post(handlers::submit_raw_transaction),
        )
        .route("/api/transactions/{txid}", get(handlers::get_transaction))
        .route("/api/sto/{txid}", get(handlers::get_sto))
        .route("/api/activations", get(handlers::get_activations))
        .with_state(state)
}
