use serde::{Deserialize, Serialize};

use super::PropertyId;

/// Sell offer sub-action carried by a DEx sell offer payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferAction {
    New,
    Update,
    Cancel,
}

impl OfferAction {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(OfferAction::New),
            2 => Some(OfferAction::Update),
            3 => Some(OfferAction::Cancel),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            OfferAction::New => 1,
            OfferAction::Update => 2,
            OfferAction::Cancel => 3,
        }
    }

    pub fn to_tag(&self) -> &'static str {
        match self {
            OfferAction::New => "new",
            OfferAction::Update => "update",
            OfferAction::Cancel => "cancel",
        }
    }
}

/// An open offer selling a property for the host chain's native coin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexOffer {
    pub seller: String,
    pub property_id: PropertyId,
    /// Amount offered by the last new/update
    pub amount_offered: i64,
    /// Amount still reserved for sale
    pub amount_remaining: i64,
    /// Native coin asked for the offered amount
    pub desired_offered: i64,
    /// Native coin asked for the remaining amount
    pub desired_remaining: i64,
    /// Blocks a buyer has to pay after accepting
    pub time_limit: u8,
    /// Mining commission required from accepts
    pub min_fee: i64,
    pub txid: String,
    pub block: u32,
}
