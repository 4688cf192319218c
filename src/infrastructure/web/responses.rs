//! Response bodies of the query API
//!
//! Token amounts are rendered as strings: eight decimals for divisible
//! properties, whole numbers for indivisible ones.

use serde::{Deserialize, Serialize};

use crate::application::engine::{CrowdsaleListing, EngineStatus};
use crate::domain::models::{
    format_amount, Balance, DexOffer, Ecosystem, FeatureActivation, Property, PropertyId,
    PropertyKind, StoReceipt, TransactionRecord,
};
use crate::domain::services::payload::Payload;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub property_id: PropertyId,
    pub name: String,
    pub divisible: bool,
    pub balance: String,
    pub reserved: String,
}

impl BalanceResponse {
    pub fn new(address: &str, property: &Property, balance: Balance) -> Self {
        Self {
            address: address.to_string(),
            property_id: property.id,
            name: property.metadata.name.clone(),
            divisible: property.divisible,
            balance: format_amount(balance.available, property.divisible),
            reserved: format_amount(balance.reserved, property.divisible),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub property_id: PropertyId,
    pub ecosystem: Ecosystem,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub url: String,
    pub data: String,
    pub divisible: bool,
    pub issuer: String,
    pub creation_txid: String,
    pub creation_block: u32,
    pub kind: PropertyKind,
    pub fixed_issuance: bool,
    pub managed_issuance: bool,
    pub total_tokens: String,
}

impl From<Property> for PropertyResponse {
    fn from(property: Property) -> Self {
        Self {
            property_id: property.id,
            ecosystem: property.ecosystem,
            fixed_issuance: property.kind == PropertyKind::Fixed,
            managed_issuance: property.is_managed(),
            total_tokens: format_amount(property.total_tokens, property.divisible),
            divisible: property.divisible,
            issuer: property.issuer,
            creation_txid: property.creation_txid,
            creation_block: property.creation_block,
            kind: property.kind,
            name: property.metadata.name,
            category: property.metadata.category,
            subcategory: property.metadata.subcategory,
            url: property.metadata.url,
            data: property.metadata.data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipationResponse {
    pub txid: String,
    pub block: u32,
    pub participant: String,
    pub amount_paid: String,
    pub participant_tokens: String,
    pub issuer_tokens: String,
}

#[derive(Debug, Serialize)]
pub struct CrowdsaleResponse {
    pub property_id: PropertyId,
    pub name: String,
    pub active: bool,
    pub issuer: String,
    pub desired_property: PropertyId,
    pub tokens_per_unit: String,
    pub deadline: i64,
    pub early_bonus: u8,
    pub issuer_percent: u8,
    pub tokens_issued: String,
    pub issuer_tokens: String,
    pub closed_early: bool,
    pub max_tokens: bool,
    pub creation_txid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_transactions: Option<Vec<ParticipationResponse>>,
}

impl CrowdsaleResponse {
    pub fn new(listing: CrowdsaleListing, verbose: bool) -> Self {
        let CrowdsaleListing {
            view,
            property: sale,
            desired,
        } = listing;
        let sale_divisible = sale.divisible;
        let participant_transactions = verbose.then(|| {
            view.participations
                .iter()
                .map(|p| ParticipationResponse {
                    txid: p.txid.clone(),
                    block: p.block,
                    participant: p.participant.clone(),
                    amount_paid: format_amount(p.amount_paid, desired.divisible),
                    participant_tokens: format_amount(p.participant_tokens, sale_divisible),
                    issuer_tokens: format_amount(p.issuer_tokens, sale_divisible),
                })
                .collect()
        });

        let crowdsale = view.sale;
        Self {
            property_id: crowdsale.property_id,
            name: sale.metadata.name.clone(),
            active: crowdsale.active,
            issuer: crowdsale.issuer,
            desired_property: crowdsale.desired_property,
            tokens_per_unit: format_amount(crowdsale.tokens_per_unit, sale_divisible),
            deadline: crowdsale.deadline,
            early_bonus: crowdsale.early_bonus,
            issuer_percent: crowdsale.issuer_percent,
            tokens_issued: format_amount(crowdsale.tokens_issued, sale_divisible),
            issuer_tokens: format_amount(crowdsale.issuer_tokens, sale_divisible),
            closed_early: crowdsale.closed_early,
            max_tokens: crowdsale.max_tokens,
            creation_txid: crowdsale.creation_txid,
            close_txid: crowdsale.close_txid,
            participant_transactions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub seller: String,
    pub property_id: PropertyId,
    pub amount_offered: String,
    pub amount_available: String,
    /// Native coin, always eight decimals
    pub desired_amount: String,
    pub desired_remaining: String,
    pub time_limit: u8,
    pub min_fee: String,
    pub txid: String,
    pub block: u32,
}

impl OfferResponse {
    pub fn new(offer: DexOffer, divisible: bool) -> Self {
        Self {
            amount_offered: format_amount(offer.amount_offered, divisible),
            amount_available: format_amount(offer.amount_remaining, divisible),
            desired_amount: format_amount(offer.desired_offered, true),
            desired_remaining: format_amount(offer.desired_remaining, true),
            min_fee: format_amount(offer.min_fee, true),
            seller: offer.seller,
            property_id: offer.property_id,
            time_limit: offer.time_limit,
            txid: offer.txid,
            block: offer.block,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    #[serde(flatten)]
    pub record: TransactionRecord,
    /// Amount field of the payload, formatted for its property
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl TransactionResponse {
    pub fn new(record: TransactionRecord, divisible: Option<bool>) -> Self {
        let amount = match (&record.payload, divisible) {
            (Some(payload), Some(divisible)) => {
                payload_amount(payload).map(|raw| format_amount(raw, divisible))
            }
            _ => None,
        };
        Self { record, amount }
    }
}

fn payload_amount(payload: &Payload) -> Option<i64> {
    match payload {
        Payload::SimpleSend { amount, .. }
        | Payload::SendToOwners { amount, .. }
        | Payload::DexSellOffer { amount, .. }
        | Payload::DexAcceptOffer { amount, .. }
        | Payload::CreatePropertyFixed { amount, .. }
        | Payload::GrantTokens { amount, .. }
        | Payload::RevokeTokens { amount, .. } => i64::try_from(*amount).ok(),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct StoRecipientResponse {
    pub address: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct StoResponse {
    pub txid: String,
    pub sender: String,
    pub block: u32,
    pub property_id: PropertyId,
    pub distribution_property: PropertyId,
    pub amount: String,
    pub fee_property: PropertyId,
    pub total_fee: String,
    pub recipient_count: usize,
    pub recipients: Vec<StoRecipientResponse>,
}

impl StoResponse {
    pub fn new(receipt: StoReceipt, divisible: bool) -> Self {
        Self {
            recipient_count: receipt.recipients.len(),
            recipients: receipt
                .recipients
                .into_iter()
                .map(|r| StoRecipientResponse {
                    address: r.address,
                    amount: format_amount(r.amount, divisible),
                })
                .collect(),
            amount: format_amount(receipt.amount, divisible),
            total_fee: format_amount(receipt.fee, true),
            txid: receipt.txid,
            sender: receipt.sender,
            block: receipt.block,
            property_id: receipt.property_id,
            distribution_property: receipt.distribution_property,
            fee_property: receipt.fee_property,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivationsResponse {
    pub pending: Vec<FeatureActivation>,
    pub completed: Vec<FeatureActivation>,
}

impl From<Vec<FeatureActivation>> for ActivationsResponse {
    fn from(all: Vec<FeatureActivation>) -> Self {
        let (completed, pending) = all.into_iter().partition(|f| f.completed);
        Self { pending, completed }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub source: String,
    pub network: String,
    pub tip_height: Option<u32>,
    pub tip_hash: Option<String>,
    pub property_count: usize,
    pub active_offers: usize,
    pub active_crowdsales: usize,
    pub pending_activations: usize,
    pub transaction_count: usize,
}

impl StatusResponse {
    pub fn new(status: EngineStatus, source: String, network: String) -> Self {
        Self {
            source,
            network,
            tip_height: status.tip.as_ref().map(|t| t.height),
            tip_hash: status.tip.map(|t| t.hash),
            property_count: status.property_count,
            active_offers: status.active_offers,
            active_crowdsales: status.active_crowdsales,
            pending_activations: status.pending_activations,
            transaction_count: status.transaction_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawTransactionRequest {
    pub sender: String,
    pub payload: String,
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RawTransactionResponse {
    pub txid: String,
}
