//! Payload types and transaction type identifiers

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

use crate::domain::models::{OfferAction, PropertyId, PropertyMetadata};

/// Transaction type identifiers as carried in the payload header
pub mod tx_type {
    pub const SIMPLE_SEND: u16 = 0;
    pub const SEND_TO_OWNERS: u16 = 3;
    pub const SEND_ALL: u16 = 4;
    pub const DEX_SELL_OFFER: u16 = 20;
    pub const DEX_ACCEPT_OFFER: u16 = 22;
    pub const CREATE_PROPERTY_FIXED: u16 = 50;
    pub const CREATE_PROPERTY_VARIABLE: u16 = 51;
    pub const CLOSE_CROWDSALE: u16 = 53;
    pub const CREATE_PROPERTY_MANUAL: u16 = 54;
    pub const GRANT_PROPERTY_TOKENS: u16 = 55;
    pub const REVOKE_PROPERTY_TOKENS: u16 = 56;
    pub const DEACTIVATION: u16 = 65533;
    pub const ACTIVATION: u16 = 65534;

    /// Version used by feature activation and deactivation messages
    pub const CONTROL_VERSION: u16 = 65535;
}

/// Display name of a transaction type
pub fn type_name(tx_type: u16) -> &'static str {
    match tx_type {
        tx_type::SIMPLE_SEND => "Simple Send",
        tx_type::SEND_TO_OWNERS => "Send To Owners",
        tx_type::SEND_ALL => "Send All",
        tx_type::DEX_SELL_OFFER => "DEx Sell Offer",
        tx_type::DEX_ACCEPT_OFFER => "DEx Accept Offer",
        tx_type::CREATE_PROPERTY_FIXED => "Create Property - Fixed",
        tx_type::CREATE_PROPERTY_VARIABLE => "Create Property - Variable",
        tx_type::CLOSE_CROWDSALE => "Close Crowdsale",
        tx_type::CREATE_PROPERTY_MANUAL => "Create Property - Manual",
        tx_type::GRANT_PROPERTY_TOKENS => "Grant Property Tokens",
        tx_type::REVOKE_PROPERTY_TOKENS => "Revoke Property Tokens",
        tx_type::DEACTIVATION => "Feature Deactivation",
        tx_type::ACTIVATION => "Feature Activation",
        _ => "Unknown",
    }
}

/// Decoded body of a metadata transaction, one variant per transaction type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    SimpleSend {
        property: PropertyId,
        amount: u64,
    },
    SendToOwners {
        property: PropertyId,
        amount: u64,
        /// Holders of this property receive the distribution (version 1)
        distribution_property: Option<PropertyId>,
    },
    SendAll {
        ecosystem: u8,
    },
    DexSellOffer {
        property: PropertyId,
        amount: u64,
        desired: u64,
        time_limit: u8,
        min_fee: u64,
        action: OfferAction,
    },
    DexAcceptOffer {
        property: PropertyId,
        amount: u64,
    },
    CreatePropertyFixed {
        ecosystem: u8,
        property_type: u16,
        previous_property: PropertyId,
        metadata: PropertyMetadata,
        amount: u64,
    },
    CreatePropertyVariable {
        ecosystem: u8,
        property_type: u16,
        previous_property: PropertyId,
        metadata: PropertyMetadata,
        desired_property: PropertyId,
        tokens_per_unit: u64,
        deadline: u64,
        early_bonus: u8,
        issuer_percent: u8,
    },
    CloseCrowdsale {
        property: PropertyId,
    },
    CreatePropertyManual {
        ecosystem: u8,
        property_type: u16,
        previous_property: PropertyId,
        metadata: PropertyMetadata,
    },
    GrantTokens {
        property: PropertyId,
        amount: u64,
        memo: String,
    },
    RevokeTokens {
        property: PropertyId,
        amount: u64,
        memo: String,
    },
    Deactivation {
        feature_id: u16,
    },
    Activation {
        feature_id: u16,
        activation_block: u32,
        min_client_version: u32,
    },
}

impl Payload {
    pub fn tx_type(&self) -> u16 {
        match self {
            Payload::SimpleSend { .. } => tx_type::SIMPLE_SEND,
            Payload::SendToOwners { .. } => tx_type::SEND_TO_OWNERS,
            Payload::SendAll { .. } => tx_type::SEND_ALL,
            Payload::DexSellOffer { .. } => tx_type::DEX_SELL_OFFER,
            Payload::DexAcceptOffer { .. } => tx_type::DEX_ACCEPT_OFFER,
            Payload::CreatePropertyFixed { .. } => tx_type::CREATE_PROPERTY_FIXED,
            Payload::CreatePropertyVariable { .. } => tx_type::CREATE_PROPERTY_VARIABLE,
            Payload::CloseCrowdsale { .. } => tx_type::CLOSE_CROWDSALE,
            Payload::CreatePropertyManual { .. } => tx_type::CREATE_PROPERTY_MANUAL,
            Payload::GrantTokens { .. } => tx_type::GRANT_PROPERTY_TOKENS,
            Payload::RevokeTokens { .. } => tx_type::REVOKE_PROPERTY_TOKENS,
            Payload::Deactivation { .. } => tx_type::DEACTIVATION,
            Payload::Activation { .. } => tx_type::ACTIVATION,
        }
    }

    /// Property the transaction primarily acts on, used for type restrictions.
    /// Issuances report their target ecosystem's protocol token.
    pub fn primary_property(&self) -> PropertyId {
        match self {
            Payload::SimpleSend { property, .. }
            | Payload::SendToOwners { property, .. }
            | Payload::DexSellOffer { property, .. }
            | Payload::DexAcceptOffer { property, .. }
            | Payload::CloseCrowdsale { property }
            | Payload::GrantTokens { property, .. }
            | Payload::RevokeTokens { property, .. } => *property,
            Payload::SendAll { ecosystem }
            | Payload::CreatePropertyFixed { ecosystem, .. }
            | Payload::CreatePropertyVariable { ecosystem, .. }
            | Payload::CreatePropertyManual { ecosystem, .. } => u32::from(*ecosystem),
            Payload::Deactivation { .. } | Payload::Activation { .. } => 0,
        }
    }
}

/// A payload together with the version it was encoded with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPayload {
    pub version: u16,
    pub payload: Payload,
}

impl DecodedPayload {
    pub fn new(version: u16, payload: Payload) -> Self {
        Self { version, payload }
    }
}

/// Reasons a payload cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Fewer than the four header bytes
    MissingHeader,
    Truncated { field: &'static str, offset: usize },
    UnknownType { tx_type: u16, version: u16 },
    UnterminatedString { field: &'static str },
    StringTooLong { field: &'static str },
    InvalidField { field: &'static str, value: u64 },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::MissingHeader => write!(f, "payload shorter than its header"),
            PayloadError::Truncated { field, offset } => {
                write!(f, "payload truncated reading {} at byte {}", field, offset)
            }
            PayloadError::UnknownType { tx_type, version } => {
                write!(f, "unknown transaction type {} version {}", tx_type, version)
            }
            PayloadError::UnterminatedString { field } => {
                write!(f, "string field {} is not terminated", field)
            }
            PayloadError::StringTooLong { field } => {
                write!(f, "string field {} exceeds 255 bytes", field)
            }
            PayloadError::InvalidField { field, value } => {
                write!(f, "invalid value {} for {}", value, field)
            }
        }
    }
}

impl Error for PayloadError {}
