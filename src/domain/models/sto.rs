use serde::{Deserialize, Serialize};

use super::PropertyId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoRecipient {
    pub address: String,
    pub amount: i64,
}

/// Distribution detail of a confirmed send-to-owners transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoReceipt {
    pub txid: String,
    pub sender: String,
    pub block: u32,
    pub property_id: PropertyId,
    /// Property whose holders received the distribution
    pub distribution_property: PropertyId,
    pub amount: i64,
    pub fee_property: PropertyId,
    pub fee: i64,
    pub recipients: Vec<StoRecipient>,
}
