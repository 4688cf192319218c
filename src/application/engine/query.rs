//! Read-only queries over the shared engine
//!
//! Every query takes the read lock, so it never observes a block that is
//! halfway applied.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::models::{
    Balance, BlockTip, Crowdsale, CrowdsaleParticipation, DexOffer, FeatureActivation, Property,
    PropertyId, StoReceipt, TransactionRecord,
};

use super::engine::ConsensusEngine;

pub type SharedEngine = Arc<RwLock<ConsensusEngine>>;

/// A crowdsale with its recorded contributions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrowdsaleView {
    pub sale: Crowdsale,
    pub participations: Vec<CrowdsaleParticipation>,
}

/// A crowdsale together with the sale property and the property it accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrowdsaleListing {
    pub view: CrowdsaleView,
    pub property: Property,
    pub desired: Property,
}

/// Engine-wide counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub tip: Option<BlockTip>,
    pub property_count: usize,
    pub active_offers: usize,
    pub active_crowdsales: usize,
    pub pending_activations: usize,
    pub transaction_count: usize,
}

#[derive(Debug, Clone)]
pub struct EngineQueries {
    engine: SharedEngine,
}

impl EngineQueries {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub async fn balance_of(&self, address: &str, property: PropertyId) -> Balance {
        self.engine.read().await.state().ledger.balance(address, property)
    }

    /// All non-empty balances of an address with their property
    pub async fn balances_for(&self, address: &str) -> Vec<(Property, Balance)> {
        let engine = self.engine.read().await;
        let state = engine.state();
        state
            .ledger
            .balances_of(address)
            .into_iter()
            .filter_map(|(id, balance)| state.registry.get(id).map(|p| (p.clone(), balance)))
            .collect()
    }

    pub async fn property_info(&self, id: PropertyId) -> Option<Property> {
        self.engine.read().await.state().registry.get(id).cloned()
    }

    pub async fn list_properties(&self) -> Vec<Property> {
        self.engine
            .read()
            .await
            .state()
            .registry
            .list()
            .cloned()
            .collect()
    }

    /// Crowdsale by its sale property, including closed ones
    pub async fn crowdsale_info(&self, id: PropertyId) -> Option<CrowdsaleView> {
        let engine = self.engine.read().await;
        let crowdsales = &engine.state().crowdsales;
        crowdsales.get(id).map(|sale| CrowdsaleView {
            sale: sale.clone(),
            participations: crowdsales.participations(id).to_vec(),
        })
    }

    pub async fn active_crowdsales(&self) -> Vec<Crowdsale> {
        self.engine
            .read()
            .await
            .state()
            .crowdsales
            .active()
            .cloned()
            .collect()
    }

    pub async fn active_offers(&self) -> Vec<DexOffer> {
        self.engine
            .read()
            .await
            .state()
            .dex
            .active()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn transaction_info(&self, txid: &str) -> Option<TransactionRecord> {
        self.engine.read().await.record(txid).cloned()
    }

    pub async fn sto_info(&self, txid: &str) -> Option<StoReceipt> {
        self.engine
            .read()
            .await
            .state()
            .sto_receipts
            .get(txid)
            .cloned()
    }

    /// Pending and completed feature activations
    pub async fn activations(&self) -> Vec<FeatureActivation> {
        self.engine
            .read()
            .await
            .state()
            .activations
            .all()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Balance of an address together with its property, or `None` for an
    /// unknown property
    pub async fn property_balance(
        &self,
        address: &str,
        id: PropertyId,
    ) -> Option<(Property, Balance)> {
        let engine = self.engine.read().await;
        let state = engine.state();
        let property = state.registry.get(id)?.clone();
        Some((property, state.ledger.balance(address, id)))
    }

    pub async fn crowdsale_listing(&self, id: PropertyId) -> Option<CrowdsaleListing> {
        let engine = self.engine.read().await;
        let state = engine.state();
        let sale = state.crowdsales.get(id)?;
        Some(CrowdsaleListing {
            property: state.registry.get(sale.property_id)?.clone(),
            desired: state.registry.get(sale.desired_property)?.clone(),
            view: CrowdsaleView {
                sale: sale.clone(),
                participations: state.crowdsales.participations(id).to_vec(),
            },
        })
    }

    pub async fn active_crowdsale_listings(&self) -> Vec<CrowdsaleListing> {
        let engine = self.engine.read().await;
        let state = engine.state();
        state
            .crowdsales
            .active()
            .filter_map(|sale| {
                Some(CrowdsaleListing {
                    property: state.registry.get(sale.property_id)?.clone(),
                    desired: state.registry.get(sale.desired_property)?.clone(),
                    view: CrowdsaleView {
                        sale: sale.clone(),
                        participations: state.crowdsales.participations(sale.property_id).to_vec(),
                    },
                })
            })
            .collect()
    }

    /// Active offers paired with the divisibility of the offered property
    pub async fn offers_with_divisibility(&self) -> Vec<(DexOffer, bool)> {
        let engine = self.engine.read().await;
        let state = engine.state();
        state
            .dex
            .active()
            .into_iter()
            .map(|offer| (offer.clone(), state.registry.is_divisible(offer.property_id)))
            .collect()
    }

    /// Transaction record with the divisibility of the property its amount
    /// is denominated in, when that property exists
    pub async fn transaction_with_divisibility(
        &self,
        txid: &str,
    ) -> Option<(TransactionRecord, Option<bool>)> {
        let engine = self.engine.read().await;
        let record = engine.record(txid)?.clone();
        let amount_property = record.details.created_property.or_else(|| {
            record
                .payload
                .as_ref()
                .map(|payload| payload.primary_property())
        });
        let divisible = amount_property
            .and_then(|id| engine.state().registry.get(id))
            .map(|property| property.divisible);
        Some((record, divisible))
    }

    pub async fn sto_with_divisibility(&self, txid: &str) -> Option<(StoReceipt, bool)> {
        let engine = self.engine.read().await;
        let state = engine.state();
        let receipt = state.sto_receipts.get(txid)?.clone();
        let divisible = state.registry.get(receipt.property_id)?.divisible;
        Some((receipt, divisible))
    }

    pub async fn tip(&self) -> Option<BlockTip> {
        self.engine.read().await.tip().cloned()
    }

    pub async fn status(&self) -> EngineStatus {
        let engine = self.engine.read().await;
        let state = engine.state();
        EngineStatus {
            tip: engine.tip().cloned(),
            property_count: state.registry.list().count(),
            active_offers: state.dex.active().len(),
            active_crowdsales: state.crowdsales.active().count(),
            pending_activations: state.activations.pending().len(),
            transaction_count: engine.records().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConsensusParams, EngineConfig, GenesisAllocation, Network};

    fn queries() -> EngineQueries {
        let config = EngineConfig {
            genesis_allocations: vec![GenesisAllocation {
                address: "alice".to_string(),
                property: 2,
                amount: 50,
            }],
            ..EngineConfig::default()
        };
        let engine = ConsensusEngine::new(ConsensusParams::for_network(Network::Regtest), config);
        EngineQueries::new(Arc::new(RwLock::new(engine)))
    }

    #[tokio::test]
    async fn test_balance_queries() {
        let queries = queries();
        assert_eq!(queries.balance_of("alice", 2).await.available, 50);
        assert_eq!(queries.balance_of("bob", 2).await, Balance::default());

        let balances = queries.balances_for("alice").await;
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].0.id, 2);
    }

    #[tokio::test]
    async fn test_status_and_lookups() {
        let queries = queries();
        let status = queries.status().await;
        assert_eq!(status.property_count, 2);
        assert!(status.tip.is_none());
        assert!(queries.property_info(3).await.is_none());
        assert!(queries.crowdsale_info(3).await.is_none());
        assert!(queries.transaction_info("missing").await.is_none());
        assert!(queries.activations().await.is_empty());
    }

    #[tokio::test]
    async fn test_composed_lookups() {
        let queries = queries();
        let (property, balance) = queries.property_balance("alice", 2).await.unwrap();
        assert_eq!(property.id, 2);
        assert_eq!(balance.available, 50);
        assert!(queries.property_balance("alice", 9).await.is_none());

        assert!(queries.crowdsale_listing(3).await.is_none());
        assert!(queries.active_crowdsale_listings().await.is_empty());
        assert!(queries.offers_with_divisibility().await.is_empty());
        assert!(queries.transaction_with_divisibility("missing").await.is_none());
        assert!(queries.sto_with_divisibility("missing").await.is_none());
    }
}
