use serde::{Deserialize, Serialize};

/// A pending or completed protocol feature activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureActivation {
    pub feature_id: u16,
    pub name: String,
    pub activation_block: u32,
    pub min_client_version: u32,
    pub completed: bool,
    pub txid: String,
}
