// Query API handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::responses::{
    ActivationsResponse, BalanceResponse, CrowdsaleResponse, OfferResponse, PropertyResponse,
    RawTransactionRequest, RawTransactionResponse, StatusResponse, StoResponse,
    TransactionResponse,
};
use super::routes::AppState;
use crate::domain::models::PropertyId;
use crate::utils::logging;

#[derive(Debug, Deserialize)]
pub struct CrowdsaleQuery {
    pub verbose: Option<bool>,
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Metalayer Indexer API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/api/health",
            "/api/status",
            "/api/balances/{address}",
            "/api/balances/{address}/{property}",
            "/api/properties",
            "/api/properties/{id}",
            "/api/crowdsales/active",
            "/api/crowdsales/{id}",
            "/api/dex/offers",
            "/api/transactions/{txid}",
            "/api/transactions/raw",
            "/api/sto/{txid}",
            "/api/activations"
        ]
    }))
}

/// GET /api/health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.queries.status().await;
    Json(StatusResponse::new(
        status,
        state.source_name.clone(),
        state.network.clone(),
    ))
}

/// GET /api/balances/{address}/{property}
pub async fn get_balance(
    State(state): State<AppState>,
    Path((address, property)): Path<(String, String)>,
) -> ApiResult<Json<BalanceResponse>> {
    let id = parse_property_id(&property)?;
    let (property, balance) = state
        .queries
        .property_balance(&address, id)
        .await
        .ok_or_else(|| property_not_found(id))?;
    Ok(Json(BalanceResponse::new(&address, &property, balance)))
}

/// GET /api/balances/{address}
pub async fn get_balances(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<Vec<BalanceResponse>> {
    let balances = state.queries.balances_for(&address).await;
    Json(
        balances
            .iter()
            .map(|(property, balance)| BalanceResponse::new(&address, property, *balance))
            .collect(),
    )
}

/// GET /api/properties
pub async fn list_properties(State(state): State<AppState>) -> Json<Vec<PropertyResponse>> {
    let properties = state.queries.list_properties().await;
    Json(properties.into_iter().map(PropertyResponse::from).collect())
}

/// GET /api/properties/{id}
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PropertyResponse>> {
    let id = parse_property_id(&id)?;
    let property = state
        .queries
        .property_info(id)
        .await
        .ok_or_else(|| property_not_found(id))?;
    Ok(Json(PropertyResponse::from(property)))
}

/// GET /api/crowdsales/active
pub async fn active_crowdsales(State(state): State<AppState>) -> Json<Vec<CrowdsaleResponse>> {
    let listings = state.queries.active_crowdsale_listings().await;
    Json(
        listings
            .into_iter()
            .map(|listing| CrowdsaleResponse::new(listing, false))
            .collect(),
    )
}

/// GET /api/crowdsales/{id}?verbose=true
pub async fn get_crowdsale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CrowdsaleQuery>,
) -> ApiResult<Json<CrowdsaleResponse>> {
    let id = parse_property_id(&id)?;
    let listing = state
        .queries
        .crowdsale_listing(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Crowdsale for property {} not found", id)))?;
    Ok(Json(CrowdsaleResponse::new(listing, query.verbose.unwrap_or(false))))
}

/// GET /api/dex/offers
pub async fn active_offers(State(state): State<AppState>) -> Json<Vec<OfferResponse>> {
    let offers = state.queries.offers_with_divisibility().await;
    Json(
        offers
            .into_iter()
            .map(|(offer, divisible)| OfferResponse::new(offer, divisible))
            .collect(),
    )
}

/// GET /api/transactions/{txid}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> ApiResult<Json<TransactionResponse>> {
    let (record, divisible) = state
        .queries
        .transaction_with_divisibility(&txid)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Transaction {} not found", txid)))?;
    Ok(Json(TransactionResponse::new(record, divisible)))
}

/// POST /api/transactions/raw
///
/// Only available when the indexer follows the in-process chain
pub async fn submit_raw_transaction(
    State(state): State<AppState>,
    Json(request): Json<RawTransactionRequest>,
) -> ApiResult<Json<RawTransactionResponse>> {
    let chain = state.local_chain.as_ref().ok_or_else(|| {
        ApiError::InvalidRequest(
            "Raw transaction submission requires the local chain source".to_string(),
        )
    })?;

    let txid = chain
        .submit_raw(
            &request.sender,
            &request.payload,
            request.reference.as_deref(),
        )
        .await?;
    logging::log_info(&format!(
        "📨 Queued transaction {} from {}",
        txid, request.sender
    ));
    Ok(Json(RawTransactionResponse { txid }))
}

/// GET /api/sto/{txid}
pub async fn get_sto(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> ApiResult<Json<StoResponse>> {
    let (receipt, divisible) = state
        .queries
        .sto_with_divisibility(&txid)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Send-to-owners {} not found", txid)))?;
    Ok(Json(StoResponse::new(receipt, divisible)))
}

/// GET /api/activations
pub async fn get_activations(State(state): State<AppState>) -> Json<ActivationsResponse> {
    Json(ActivationsResponse::from(state.queries.activations().await))
}

fn parse_property_id(raw: &str) -> ApiResult<PropertyId> {
    raw.parse::<PropertyId>()
        .map_err(|_| ApiError::InvalidRequest(format!("Invalid property id: {}", raw)))
}

fn property_not_found(id: PropertyId) -> ApiError {
    ApiError::NotFound(format!("Property {} not found", id))
}
