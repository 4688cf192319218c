use serde::{Deserialize, Serialize};

pub type PropertyId = u32;

/// The host chain's native coin, never a token
pub const PROPERTY_HOST_COIN: PropertyId = 0;
/// Protocol token of the main ecosystem
pub const PROPERTY_MAIN_TOKEN: PropertyId = 1;
/// Protocol token of the test ecosystem
pub const PROPERTY_TEST_TOKEN: PropertyId = 2;
/// First id handed out by main ecosystem issuances
pub const MAIN_ECOSYSTEM_FIRST_ID: PropertyId = 3;
/// Last id belonging to the main ecosystem
pub const MAIN_ECOSYSTEM_LAST_ID: PropertyId = 2_147_483_650;
/// First id handed out by test ecosystem issuances
pub const TEST_ECOSYSTEM_FIRST_ID: PropertyId = 2_147_483_651;

/// One of the two disjoint property id ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Main,
    Test,
}

impl Ecosystem {
    /// Decodes the wire value (1 = main, 2 = test)
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Ecosystem::Main),
            2 => Some(Ecosystem::Test),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Ecosystem::Main => 1,
            Ecosystem::Test => 2,
        }
    }

    /// Ecosystem a property id belongs to; the host coin belongs to none
    pub fn of(id: PropertyId) -> Option<Self> {
        match id {
            PROPERTY_HOST_COIN => None,
            PROPERTY_MAIN_TOKEN => Some(Ecosystem::Main),
            PROPERTY_TEST_TOKEN => Some(Ecosystem::Test),
            id if id <= MAIN_ECOSYSTEM_LAST_ID => Some(Ecosystem::Main),
            _ => Some(Ecosystem::Test),
        }
    }

    /// Protocol token used for fees within the ecosystem
    pub fn protocol_token(self) -> PropertyId {
        match self {
            Ecosystem::Main => PROPERTY_MAIN_TOKEN,
            Ecosystem::Test => PROPERTY_TEST_TOKEN,
        }
    }

    pub fn first_id(self) -> PropertyId {
        match self {
            Ecosystem::Main => MAIN_ECOSYSTEM_FIRST_ID,
            Ecosystem::Test => TEST_ECOSYSTEM_FIRST_ID,
        }
    }
}

/// How a property's supply comes into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Pre-registered protocol token
    Protocol,
    /// Entire supply issued at creation
    Fixed,
    /// Supply granted and revoked by the issuer
    Managed,
    /// Supply minted by crowdsale contributions
    Crowdsale,
}

/// Display metadata of a property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub category: String,
    pub subcategory: String,
    pub name: String,
    pub url: String,
    pub data: String,
}

/// An issued token type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub ecosystem: Ecosystem,
    pub divisible: bool,
    pub issuer: String,
    pub creation_txid: String,
    pub creation_block: u32,
    pub total_tokens: i64,
    pub kind: PropertyKind,
    pub metadata: PropertyMetadata,
}

impl Property {
    pub fn is_managed(&self) -> bool {
        self.kind == PropertyKind::Managed
    }

    pub fn is_crowdsale(&self) -> bool {
        self.kind == PropertyKind::Crowdsale
    }
}
