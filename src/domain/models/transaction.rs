use serde::{Deserialize, Serialize};

use super::PropertyId;
use crate::domain::services::payload::Payload;

/// Tokens minted to a crowdsale participant by a simple send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsalePurchase {
    pub property_id: PropertyId,
    pub tokens: i64,
    pub issuer_tokens: i64,
}

/// One property moved by a send-all transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSend {
    pub property_id: PropertyId,
    pub amount: i64,
}

/// Effects of a valid transaction beyond its decoded fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDetails {
    /// Property created by an issuance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_property: Option<PropertyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase: Option<CrowdsalePurchase>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sub_sends: Vec<SubSend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sto_recipients: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sto_fee: Option<i64>,
}

/// Verdict and decoded content of a transaction seen in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: String,
    pub sender: String,
    pub reference: Option<String>,
    pub block_height: u32,
    pub block_hash: String,
    pub block_time: i64,
    /// Index among the metadata transactions of the block
    pub position: u32,
    pub tx_type: Option<u16>,
    pub version: Option<u16>,
    pub type_name: String,
    pub valid: bool,
    pub invalid_reason: Option<String>,
    pub payload: Option<Payload>,
    pub details: TxDetails,
}
