use serde::{Deserialize, Serialize};

/// A candidate metadata transaction as delivered by the host chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTx {
    pub txid: String,
    /// Address that funded the transaction
    pub sender: String,
    /// Recipient address, if the transaction names one
    pub reference: Option<String>,
    /// Raw payload bytes following the marker
    pub payload: Vec<u8>,
}

/// A confirmed block with its metadata transactions in block order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBlock {
    pub height: u32,
    pub hash: String,
    pub parent_hash: String,
    /// Block timestamp in seconds
    pub time: i64,
    pub transactions: Vec<ChainTx>,
}

/// Last block applied to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTip {
    pub height: u32,
    pub hash: String,
}
