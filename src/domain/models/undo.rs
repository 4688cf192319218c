//! Inverse operations recorded while a block is applied
//!
//! Every state mutation pushes the value it overwrote. Reverting a log walks
//! it backwards and restores those values, which yields the exact prior state.

use serde::{Deserialize, Serialize};

use super::{Balance, Crowdsale, DexOffer, Ecosystem, FeatureActivation, PropertyId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UndoOp {
    Balance {
        address: String,
        property: PropertyId,
        previous: Balance,
    },
    Supply {
        property: PropertyId,
        previous: i64,
    },
    PropertyCreated {
        property: PropertyId,
        ecosystem: Ecosystem,
        previous_next_id: PropertyId,
    },
    Crowdsale {
        property: PropertyId,
        previous: Option<Crowdsale>,
    },
    Participation {
        property: PropertyId,
    },
    Offer {
        seller: String,
        property: PropertyId,
        previous: Option<DexOffer>,
    },
    Activation {
        feature_id: u16,
        previous: Option<FeatureActivation>,
    },
    StoReceipt {
        txid: String,
    },
}

/// Append-only list of inverse operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoLog {
    ops: Vec<UndoOp>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: UndoOp) {
        self.ops.push(op);
    }

    /// Current length, usable as a savepoint
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Removes and returns the operations recorded after `savepoint`, newest first
    pub fn drain_since(&mut self, savepoint: usize) -> Vec<UndoOp> {
        let mut ops = self.ops.split_off(savepoint.min(self.ops.len()));
        ops.reverse();
        ops
    }

    /// Consumes the log, newest operation first
    pub fn into_reversed(mut self) -> Vec<UndoOp> {
        self.ops.reverse();
        self.ops
    }
}

/// Undo information for one applied block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUndo {
    pub height: u32,
    pub hash: String,
    pub parent_hash: String,
    pub log: UndoLog,
    /// Transactions recorded in the block, in block order
    pub txids: Vec<String>,
}
