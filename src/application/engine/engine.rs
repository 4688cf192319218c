//! Consensus engine
//!
//! Applies blocks strictly in height order and transactions strictly in block
//! order. Every mutation is recorded in a per-block undo log, which is what
//! rollback replays backwards on a reorganization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{ConsensusParams, EngineConfig};
use crate::domain::errors::{EngineError, ProtocolError};
use crate::domain::models::{
    BlockTip, BlockUndo, ChainBlock, ChainTx, TransactionRecord, TxDetails, UndoLog,
};
use crate::domain::services::payload::{decode_payload, peek_header, type_name};
use crate::utils::logging;

use super::dispatch::{self, Rules, TxContext};
use super::state::EngineState;

/// Reason stored on records whose block left the active chain
pub const REORGANIZED_REASON: &str = "Block was reorganized";

/// Outcome of applying one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub height: u32,
    pub hash: String,
    pub transactions: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// Serializable image of an engine, enough to resume where it stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub undo_chain: BTreeMap<u32, BlockUndo>,
    pub records: BTreeMap<String, TransactionRecord>,
    pub tip: Option<BlockTip>,
}

#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    params: ConsensusParams,
    config: EngineConfig,
    state: EngineState,
    undo_chain: BTreeMap<u32, BlockUndo>,
    records: BTreeMap<String, TransactionRecord>,
    tip: Option<BlockTip>,
}

impl ConsensusEngine {
    /// Engine at genesis, with the configured allocations credited
    pub fn new(params: ConsensusParams, config: EngineConfig) -> Self {
        let mut state = EngineState::new();
        let mut genesis_log = UndoLog::new();
        for allocation in &config.genesis_allocations {
            if let Err(e) = state.registry.mint(
                &mut state.ledger,
                &allocation.address,
                allocation.property,
                allocation.amount,
                &mut genesis_log,
            ) {
                logging::log_warning(&format!(
                    "Skipping genesis allocation of {} to {} in property {}: {}",
                    allocation.amount, allocation.address, allocation.property, e
                ));
            }
        }

        Self {
            params,
            config,
            state,
            undo_chain: BTreeMap::new(),
            records: BTreeMap::new(),
            tip: None,
        }
    }

    pub fn from_snapshot(
        params: ConsensusParams,
        config: EngineConfig,
        snapshot: EngineSnapshot,
    ) -> Self {
        Self {
            params,
            config,
            state: snapshot.state,
            undo_chain: snapshot.undo_chain,
            records: snapshot.records,
            tip: snapshot.tip,
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state.clone(),
            undo_chain: self.undo_chain.clone(),
            records: self.records.clone(),
            tip: self.tip.clone(),
        }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn tip(&self) -> Option<&BlockTip> {
        self.tip.as_ref()
    }

    /// Height of the next block the engine expects
    pub fn next_height(&self) -> u32 {
        self.tip
            .as_ref()
            .map(|t| t.height + 1)
            .unwrap_or(self.params.genesis_block)
    }

    pub fn record(&self, txid: &str) -> Option<&TransactionRecord> {
        self.records.get(txid)
    }

    pub fn records(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.values()
    }

    /// Hash of an applied block still inside the retained window
    pub fn block_hash_at(&self, height: u32) -> Option<&str> {
        match &self.tip {
            Some(tip) if tip.height == height => Some(tip.hash.as_str()),
            _ => self.undo_chain.get(&height).map(|u| u.hash.as_str()),
        }
    }

    /// Lowest height the engine can still roll back to
    pub fn earliest_rollback_height(&self) -> Option<u32> {
        self.undo_chain.keys().next().map(|h| h.saturating_sub(1))
    }

    /// Apply the next block of the chain
    pub fn apply_block(&mut self, block: &ChainBlock) -> Result<BlockSummary, EngineError> {
        let expected = self.next_height();
        if block.height != expected {
            return Err(EngineError::OutOfOrderBlock {
                expected,
                got: block.height,
            });
        }
        if let Some(tip) = &self.tip {
            if tip.hash != block.parent_hash {
                return Err(EngineError::ParentMismatch {
                    height: block.height,
                    expected: tip.hash.clone(),
                    got: block.parent_hash.clone(),
                });
            }
        }

        let mut undo = UndoLog::new();

        // Scheduled features and expired sales take effect before any transaction
        for feature_id in self
            .state
            .activations
            .complete_pending(block.height, &mut undo)
        {
            logging::log_info(&format!(
                "✨ Feature {} activated at block {}",
                feature_id, block.height
            ));
        }
        for property in self
            .state
            .crowdsales
            .expire(block.time, block.height, &mut undo)
        {
            logging::log_info(&format!(
                "⏰ Crowdsale for property {} expired at block {}",
                property, block.height
            ));
        }

        let mut txids = Vec::with_capacity(block.transactions.len());
        let mut valid = 0;
        for (position, tx) in block.transactions.iter().enumerate() {
            let record = self.process_transaction(block, position as u32, tx, &mut undo);
            if record.valid {
                valid += 1;
            }
            txids.push(record.txid.clone());
            self.records.insert(record.txid.clone(), record);
        }

        self.undo_chain.insert(
            block.height,
            BlockUndo {
                height: block.height,
                hash: block.hash.clone(),
                parent_hash: block.parent_hash.clone(),
                log: undo,
                txids,
            },
        );
        self.prune_undo(block.height);
        self.tip = Some(BlockTip {
            height: block.height,
            hash: block.hash.clone(),
        });

        Ok(BlockSummary {
            height: block.height,
            hash: block.hash.clone(),
            transactions: block.transactions.len(),
            valid,
            invalid: block.transactions.len() - valid,
        })
    }

    fn process_transaction(
        &mut self,
        block: &ChainBlock,
        position: u32,
        tx: &ChainTx,
        undo: &mut UndoLog,
    ) -> TransactionRecord {
        let header = peek_header(&tx.payload);
        let mut record = TransactionRecord {
            txid: tx.txid.clone(),
            sender: tx.sender.clone(),
            reference: tx.reference.clone(),
            block_height: block.height,
            block_hash: block.hash.clone(),
            block_time: block.time,
            position,
            tx_type: header.map(|(_, t)| t),
            version: header.map(|(v, _)| v),
            type_name: header
                .map(|(_, t)| type_name(t))
                .unwrap_or("Unknown")
                .to_string(),
            valid: false,
            invalid_reason: None,
            payload: None,
            details: TxDetails::default(),
        };

        let decoded = match decode_payload(&tx.payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                let reason = ProtocolError::from(e);
                record.invalid_reason = Some(reason.to_string());
                logging::log_debug(&format!("❌ Tx {} invalid: {}", tx.txid, reason));
                return record;
            }
        };
        record.payload = Some(decoded.payload.clone());

        let ctx = TxContext {
            txid: &tx.txid,
            sender: &tx.sender,
            reference: tx.reference.as_deref(),
            block: block.height,
            block_time: block.time,
        };
        let rules = Rules {
            params: &self.params,
            config: &self.config,
        };

        let savepoint = undo.len();
        match dispatch::execute(&mut self.state, &rules, &ctx, &decoded, undo) {
            Ok(details) => {
                record.valid = true;
                record.details = details;
                logging::log_debug(&format!(
                    "✅ Tx {} valid: {}",
                    tx.txid, record.type_name
                ));
            }
            Err(reason) => {
                for op in undo.drain_since(savepoint) {
                    self.state.revert(op);
                }
                record.invalid_reason = Some(reason.to_string());
                logging::log_debug(&format!("❌ Tx {} invalid: {}", tx.txid, reason));
            }
        }
        record
    }

    /// Roll the state back so that `height` is the tip again
    pub fn rollback_to(&mut self, height: u32) -> Result<Vec<String>, EngineError> {
        let tip_height = match &self.tip {
            Some(tip) if tip.height > height => tip.height,
            _ => return Ok(Vec::new()),
        };

        if let Some(missing) = (height + 1..=tip_height).find(|h| !self.undo_chain.contains_key(h))
        {
            return Err(EngineError::ReorgInconsistency(format!(
                "no undo log for block {} while rolling back to {}",
                missing, height
            )));
        }

        let mut disconnected = Vec::new();
        for h in (height + 1..=tip_height).rev() {
            let Some(block_undo) = self.undo_chain.remove(&h) else {
                return Err(EngineError::ReorgInconsistency(format!(
                    "undo log for block {} disappeared",
                    h
                )));
            };
            for op in block_undo.log.into_reversed() {
                self.state.revert(op);
            }
            for txid in block_undo.txids.iter().rev() {
                if let Some(record) = self.records.get_mut(txid) {
                    record.valid = false;
                    record.invalid_reason = Some(REORGANIZED_REASON.to_string());
                }
                disconnected.push(txid.clone());
            }
            self.tip = if h > self.params.genesis_block {
                Some(BlockTip {
                    height: h - 1,
                    hash: block_undo.parent_hash,
                })
            } else {
                None
            };
        }

        self.verify_supply()?;
        logging::log_warning(&format!(
            "⏪ Rolled back {} blocks to height {}, {} transactions disconnected",
            tip_height - height,
            height,
            disconnected.len()
        ));
        Ok(disconnected)
    }

    /// Checks that supply totals and balances agree
    pub fn verify_supply(&self) -> Result<(), EngineError> {
        let mismatches = self.state.supply_mismatches();
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(EngineError::ReorgInconsistency(mismatches.join("; ")))
        }
    }

    fn prune_undo(&mut self, height: u32) {
        let depth = self.config.max_reorg_depth.max(1);
        if height < depth {
            return;
        }
        let keep_from = height - depth + 1;
        self.undo_chain = self.undo_chain.split_off(&keep_from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenesisAllocation, Network};
    use crate::domain::models::PropertyMetadata;
    use crate::domain::services::payload::{encode, Payload};

    fn engine() -> ConsensusEngine {
        let config = EngineConfig {
            genesis_allocations: vec![GenesisAllocation {
                address: "alice".to_string(),
                property: 1,
                amount: 1_000,
            }],
            ..EngineConfig::default()
        };
        ConsensusEngine::new(ConsensusParams::for_network(Network::Regtest), config)
    }

    fn tx(txid: &str, sender: &str, reference: Option<&str>, payload: Payload) -> ChainTx {
        ChainTx {
            txid: txid.to_string(),
            sender: sender.to_string(),
            reference: reference.map(|r| r.to_string()),
            payload: encode(payload),
        }
    }

    fn block(height: u32, parent: &str, transactions: Vec<ChainTx>) -> ChainBlock {
        ChainBlock {
            height,
            hash: format!("h{}", height),
            parent_hash: parent.to_string(),
            time: 1_000 + i64::from(height),
            transactions,
        }
    }

    fn send(txid: &str, from: &str, to: &str, amount: u64) -> ChainTx {
        tx(
            txid,
            from,
            Some(to),
            Payload::SimpleSend {
                property: 1,
                amount,
            },
        )
    }

    #[test]
    fn test_genesis_allocation() {
        let engine = engine();
        assert_eq!(engine.state().ledger.available("alice", 1), 1_000);
        assert_eq!(engine.state().registry.get(1).unwrap().total_tokens, 1_000);
        assert_eq!(engine.next_height(), 0);
    }

    #[test]
    fn test_apply_records_verdicts() {
        let mut engine = engine();
        engine.apply_block(&block(0, "", vec![])).unwrap();
        let summary = engine
            .apply_block(&block(
                1,
                "h0",
                vec![send("t1", "alice", "bob", 400), send("t2", "bob", "carol", 401)],
            ))
            .unwrap();

        assert_eq!(summary.valid, 1);
        assert_eq!(summary.invalid, 1);
        assert!(engine.record("t1").unwrap().valid);
        assert_eq!(
            engine.record("t2").unwrap().invalid_reason.as_deref(),
            Some("Sender has insufficient balance")
        );
        assert_eq!(engine.state().ledger.available("bob", 1), 400);
    }

    #[test]
    fn test_failed_transaction_leaves_no_trace() {
        let mut engine = engine();
        engine.apply_block(&block(0, "", vec![])).unwrap();
        let before = engine.state().clone();
        // STO with no other holders fails after passing the balance check
        let sto = tx(
            "t1",
            "alice",
            None,
            Payload::SendToOwners {
                property: 1,
                amount: 10,
                distribution_property: None,
            },
        );
        engine.apply_block(&block(1, "h0", vec![sto])).unwrap();
        assert_eq!(engine.state(), &before);
        assert_eq!(
            engine.record("t1").unwrap().invalid_reason.as_deref(),
            Some("No owners to distribute to")
        );
    }

    #[test]
    fn test_rollback_restores_state_and_marks_records() {
        let mut engine = engine();
        engine.apply_block(&block(0, "", vec![])).unwrap();
        engine
            .apply_block(&block(1, "h0", vec![send("t1", "alice", "bob", 100)]))
            .unwrap();
        let after_one = engine.state().clone();

        let create = tx(
            "t2",
            "bob",
            None,
            Payload::CreatePropertyFixed {
                ecosystem: 1,
                property_type: 1,
                previous_property: 0,
                metadata: PropertyMetadata {
                    name: "Quantum".to_string(),
                    ..PropertyMetadata::default()
                },
                amount: 77,
            },
        );
        engine.apply_block(&block(2, "h1", vec![create])).unwrap();
        assert!(engine.state().registry.exists(3));

        let disconnected = engine.rollback_to(1).unwrap();
        assert_eq!(disconnected, vec!["t2".to_string()]);
        assert_eq!(engine.state(), &after_one);
        assert_eq!(engine.tip().unwrap().hash, "h1");
        assert_eq!(
            engine.record("t2").unwrap().invalid_reason.as_deref(),
            Some(REORGANIZED_REASON)
        );
        assert_eq!(engine.state().registry.next_id(crate::domain::models::Ecosystem::Main), 3);
    }

    #[test]
    fn test_out_of_order_and_wrong_parent() {
        let mut engine = engine();
        engine.apply_block(&block(0, "", vec![])).unwrap();
        assert_eq!(
            engine.apply_block(&block(2, "h1", vec![])),
            Err(EngineError::OutOfOrderBlock {
                expected: 1,
                got: 2
            })
        );
        assert!(matches!(
            engine.apply_block(&block(1, "other", vec![])),
            Err(EngineError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn test_rollback_beyond_retained_window() {
        let config = EngineConfig {
            max_reorg_depth: 2,
            ..EngineConfig::default()
        };
        let mut engine =
            ConsensusEngine::new(ConsensusParams::for_network(Network::Regtest), config);
        let mut parent = String::new();
        for height in 0..5 {
            engine.apply_block(&block(height, &parent, vec![])).unwrap();
            parent = format!("h{}", height);
        }
        assert_eq!(engine.earliest_rollback_height(), Some(2));
        assert!(matches!(
            engine.rollback_to(1),
            Err(EngineError::ReorgInconsistency(_))
        ));
        assert!(engine.rollback_to(2).is_ok());
    }

    #[test]
    fn test_snapshot_roundtrip_resumes() {
        let mut engine = engine();
        engine.apply_block(&block(0, "", vec![])).unwrap();
        engine
            .apply_block(&block(1, "h0", vec![send("t1", "alice", "bob", 5)]))
            .unwrap();

        let snapshot = engine.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: EngineSnapshot = serde_json::from_str(&json).unwrap();
        let resumed = ConsensusEngine::from_snapshot(
            engine.params().clone(),
            engine.config().clone(),
            restored,
        );
        assert_eq!(resumed.state(), engine.state());
        assert_eq!(resumed.next_height(), 2);
    }
}
