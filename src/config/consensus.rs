//! Per-network consensus parameters

use super::Network;
use crate::domain::models::{Ecosystem, PropertyId};
use crate::domain::services::payload::tx_type;

/// Block at which a transaction type and version becomes valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRestriction {
    pub tx_type: u16,
    pub version: u16,
    pub activation_block: u32,
}

/// Consensus parameters shared by every engine instance on a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParams {
    /// First block processed by the engine
    pub genesis_block: u32,
    /// Minimum number of blocks of notice for a feature activation
    pub min_activation_blocks: u32,
    /// Maximum number of blocks of notice for a feature activation
    pub max_activation_blocks: u32,
    pub restrictions: Vec<TransactionRestriction>,
}

struct EnableBlocks {
    send: u32,
    dex: u32,
    smart_property: u32,
    managed_property: u32,
    sto: u32,
    sto_v1: u32,
    send_all: u32,
    alert: u32,
}

impl ConsensusParams {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::build(
                249_498,
                2048,
                12288,
                EnableBlocks {
                    send: 249_498,
                    dex: 290_630,
                    smart_property: 297_110,
                    managed_property: 323_230,
                    sto: 342_650,
                    sto_v1: 999_999,
                    send_all: 395_000,
                    alert: 0,
                },
            ),
            Network::Testnet => Self::build(0, 5, 99_999, EnableBlocks::all_at(0)),
            Network::Regtest => Self::build(0, 5, 10, EnableBlocks::all_at(0)),
        }
    }

    fn build(genesis: u32, min: u32, max: u32, blocks: EnableBlocks) -> Self {
        let r = |tx_type, version, activation_block| TransactionRestriction {
            tx_type,
            version,
            activation_block,
        };
        Self {
            genesis_block: genesis,
            min_activation_blocks: min,
            max_activation_blocks: max,
            restrictions: vec![
                r(tx_type::SIMPLE_SEND, 0, blocks.send),
                r(tx_type::SEND_TO_OWNERS, 0, blocks.sto),
                r(tx_type::SEND_TO_OWNERS, 1, blocks.sto_v1),
                r(tx_type::SEND_ALL, 0, blocks.send_all),
                r(tx_type::DEX_SELL_OFFER, 0, blocks.dex),
                r(tx_type::DEX_SELL_OFFER, 1, blocks.dex),
                r(tx_type::DEX_ACCEPT_OFFER, 0, blocks.dex),
                r(tx_type::CREATE_PROPERTY_FIXED, 0, blocks.smart_property),
                r(tx_type::CREATE_PROPERTY_VARIABLE, 0, blocks.smart_property),
                r(tx_type::CLOSE_CROWDSALE, 0, blocks.smart_property),
                r(tx_type::CREATE_PROPERTY_MANUAL, 0, blocks.managed_property),
                r(tx_type::GRANT_PROPERTY_TOKENS, 0, blocks.managed_property),
                r(tx_type::REVOKE_PROPERTY_TOKENS, 0, blocks.managed_property),
                r(tx_type::DEACTIVATION, tx_type::CONTROL_VERSION, blocks.alert),
                r(tx_type::ACTIVATION, tx_type::CONTROL_VERSION, blocks.alert),
            ],
        }
    }

    /// Checks, if the transaction type and version is enabled at the given block.
    /// Test ecosystem properties are never restricted.
    pub fn is_transaction_type_allowed(
        &self,
        block: u32,
        property: PropertyId,
        tx_type: u16,
        version: u16,
    ) -> bool {
        self.restrictions
            .iter()
            .filter(|entry| entry.tx_type == tx_type && entry.version == version)
            .any(|entry| {
                Ecosystem::of(property) == Some(Ecosystem::Test) || block >= entry.activation_block
            })
    }

    /// Overrides the enable block of one transaction type, for all versions
    pub fn set_activation_block(&mut self, tx_type: u16, block: u32) {
        for entry in self.restrictions.iter_mut().filter(|e| e.tx_type == tx_type) {
            entry.activation_block = block;
        }
    }
}

impl EnableBlocks {
    fn all_at(block: u32) -> Self {
        Self {
            send: block,
            dex: block,
            smart_property: block,
            managed_property: block,
            sto: block,
            sto_v1: block,
            send_all: block,
            alert: block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_restrictions() {
        let params = ConsensusParams::for_network(Network::Mainnet);
        assert!(!params.is_transaction_type_allowed(394_999, 3, tx_type::SEND_ALL, 0));
        assert!(params.is_transaction_type_allowed(395_000, 3, tx_type::SEND_ALL, 0));
        // test ecosystem is unrestricted
        assert!(params.is_transaction_type_allowed(1, 2_147_483_651, tx_type::SEND_ALL, 0));
        // unknown version is never allowed
        assert!(!params.is_transaction_type_allowed(500_000, 3, tx_type::SEND_ALL, 7));
    }

    #[test]
    fn test_regtest_grace_window() {
        let params = ConsensusParams::for_network(Network::Regtest);
        assert_eq!(params.min_activation_blocks, 5);
        assert_eq!(params.max_activation_blocks, 10);
        assert!(params.is_transaction_type_allowed(0, 1, tx_type::SIMPLE_SEND, 0));
    }
}
