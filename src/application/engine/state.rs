//! Aggregate protocol state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::models::{StoReceipt, UndoOp};
use crate::domain::services::{
    ActivationManager, CrowdsaleBook, DexBook, Ledger, PropertyRegistry,
};

/// Everything the consensus engine derives from the chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub registry: PropertyRegistry,
    pub ledger: Ledger,
    pub crowdsales: CrowdsaleBook,
    pub dex: DexBook,
    pub activations: ActivationManager,
    pub sto_receipts: BTreeMap<String, StoReceipt>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the inverse of one recorded mutation
    pub fn revert(&mut self, op: UndoOp) {
        match op {
            UndoOp::Balance {
                address,
                property,
                previous,
            } => self.ledger.restore(&address, property, previous),
            UndoOp::Supply { property, previous } => {
                self.registry.restore_supply(property, previous)
            }
            UndoOp::PropertyCreated {
                property,
                ecosystem,
                previous_next_id,
            } => self
                .registry
                .remove_created(property, ecosystem, previous_next_id),
            UndoOp::Crowdsale { property, previous } => {
                self.crowdsales.restore(property, previous)
            }
            UndoOp::Participation { property } => self.crowdsales.pop_participation(property),
            UndoOp::Offer {
                seller,
                property,
                previous,
            } => self.dex.restore(&seller, property, previous),
            UndoOp::Activation {
                feature_id,
                previous,
            } => self.activations.restore(feature_id, previous),
            UndoOp::StoReceipt { txid } => {
                self.sto_receipts.remove(&txid);
            }
        }
    }

    /// Checks that every property's registered supply equals the sum of its balances
    pub fn supply_mismatches(&self) -> Vec<String> {
        let mut mismatches: Vec<String> = self
            .registry
            .list()
            .filter(|p| i128::from(p.total_tokens) != self.ledger.total_for(p.id))
            .map(|p| {
                format!(
                    "property {} registers {} but balances sum to {}",
                    p.id,
                    p.total_tokens,
                    self.ledger.total_for(p.id)
                )
            })
            .collect();

        mismatches.extend(
            self.ledger
                .known_properties()
                .into_iter()
                .filter(|id| !self.registry.exists(*id))
                .map(|id| format!("balances exist for unknown property {}", id)),
        );
        mismatches
    }
}
