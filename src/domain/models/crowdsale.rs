use serde::{Deserialize, Serialize};

use super::PropertyId;

/// A token sale minting `property_id` for payments in `desired_property`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crowdsale {
    pub property_id: PropertyId,
    pub issuer: String,
    pub desired_property: PropertyId,
    /// Sale tokens (raw) per whole unit of the desired property
    pub tokens_per_unit: i64,
    /// Absolute deadline, seconds
    pub deadline: i64,
    /// Early-bonus percentage per bonus period left before the deadline
    pub early_bonus: u8,
    pub issuer_percent: u8,
    /// Cumulative tokens minted to participants
    pub tokens_issued: i64,
    /// Cumulative bonus tokens minted to the issuer
    pub issuer_tokens: i64,
    pub active: bool,
    pub closed_early: bool,
    pub max_tokens: bool,
    pub creation_txid: String,
    pub close_txid: Option<String>,
    pub close_block: Option<u32>,
}

/// One contribution to a crowdsale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsaleParticipation {
    pub txid: String,
    pub block: u32,
    pub participant: String,
    pub amount_paid: i64,
    pub participant_tokens: i64,
    pub issuer_tokens: i64,
}
