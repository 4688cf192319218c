//! Feature activation manager
//!
//! Features are scheduled for a future block inside a grace window and
//! switch on once the chain reaches that block.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::errors::ProtocolError;
use crate::domain::models::{FeatureActivation, UndoLog, UndoOp};

pub const FEATURE_CLASS_C: u16 = 1;
pub const FEATURE_METADEX: u16 = 2;
pub const FEATURE_BETTING: u16 = 3;
pub const FEATURE_GRANT_EFFECTS: u16 = 4;
pub const FEATURE_DEX_MATH: u16 = 5;
pub const FEATURE_SEND_ALL: u16 = 6;
pub const FEATURE_SP_CROWD_CROSSOVER: u16 = 7;
pub const FEATURE_TRADE_ALL_PAIRS: u16 = 8;
pub const FEATURE_FEES: u16 = 9;
pub const FEATURE_STO_V1: u16 = 10;
pub const FEATURE_FREEZE_NOTICE: u16 = 14;
pub const FEATURE_FREE_DEX: u16 = 15;

/// Human readable name of a known feature
pub fn feature_name(feature_id: u16) -> Option<&'static str> {
    match feature_id {
        FEATURE_CLASS_C => Some("Class C transaction encoding"),
        FEATURE_METADEX => Some("Distributed Meta Token Exchange"),
        FEATURE_BETTING => Some("Bet transactions"),
        FEATURE_GRANT_EFFECTS => Some("Remove grant side effects"),
        FEATURE_DEX_MATH => Some("DEx integer math update"),
        FEATURE_SEND_ALL => Some("Send All transactions"),
        FEATURE_SP_CROWD_CROSSOVER => Some("Disable crowdsale ecosystem crossovers"),
        FEATURE_TRADE_ALL_PAIRS => Some("Allow trading all pairs on the Distributed Exchange"),
        FEATURE_FEES => Some("Fee system (inc 0.05% fee from trades of non-Omni pairs)"),
        FEATURE_STO_V1 => Some("Cross-property Send To Owners"),
        FEATURE_FREEZE_NOTICE => Some("Activate the waiting period for enabling freezing"),
        FEATURE_FREE_DEX => Some("Activate trading of any token on the distributed exchange"),
        _ => None,
    }
}

/// Grace window an activation must fall into, in blocks ahead of the
/// transaction's block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceWindow {
    pub min: u32,
    pub max: u32,
}

impl GraceWindow {
    pub fn check(&self, tx_height: u32, activation_block: u32) -> Result<(), ProtocolError> {
        let offset = i64::from(activation_block) - i64::from(tx_height);
        if offset < i64::from(self.min) || offset > i64::from(self.max) {
            return Err(ProtocolError::GracePeriodViolation {
                offset,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// What an accepted activation request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Scheduled,
    /// The feature was already live, the request changed nothing
    AlreadyActive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationManager {
    features: BTreeMap<u16, FeatureActivation>,
}

impl ActivationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, feature_id: u16) -> Option<&FeatureActivation> {
        self.features.get(&feature_id)
    }

    pub fn all(&self) -> Vec<&FeatureActivation> {
        self.features.values().collect()
    }

    pub fn completed(&self) -> Vec<&FeatureActivation> {
        self.features.values().filter(|f| f.completed).collect()
    }

    pub fn pending(&self) -> Vec<&FeatureActivation> {
        self.features.values().filter(|f| !f.completed).collect()
    }

    pub fn is_active(&self, feature_id: u16) -> bool {
        self.get(feature_id).map(|f| f.completed).unwrap_or(false)
    }

    /// Schedules a feature for activation
    #[allow(clippy::too_many_arguments)]
    pub fn activate(
        &mut self,
        feature_id: u16,
        activation_block: u32,
        min_client_version: u32,
        tx_height: u32,
        window: GraceWindow,
        txid: &str,
        undo: &mut UndoLog,
    ) -> Result<ActivationOutcome, ProtocolError> {
        let name = feature_name(feature_id).ok_or(ProtocolError::UnknownFeature(feature_id))?;
        window.check(tx_height, activation_block)?;

        if self.is_active(feature_id) {
            return Ok(ActivationOutcome::AlreadyActive);
        }

        self.put(
            FeatureActivation {
                feature_id,
                name: name.to_string(),
                activation_block,
                min_client_version,
                completed: false,
                txid: txid.to_string(),
            },
            undo,
        );
        Ok(ActivationOutcome::Scheduled)
    }

    /// Disables a pending or live feature
    pub fn deactivate(&mut self, feature_id: u16, undo: &mut UndoLog) -> Result<(), ProtocolError> {
        if feature_name(feature_id).is_none() {
            return Err(ProtocolError::UnknownFeature(feature_id));
        }
        let previous = self
            .features
            .remove(&feature_id)
            .ok_or(ProtocolError::FeatureNotActive(feature_id))?;
        undo.push(UndoOp::Activation {
            feature_id,
            previous: Some(previous),
        });
        Ok(())
    }

    /// Completes every pending activation whose block has been reached
    pub fn complete_pending(&mut self, height: u32, undo: &mut UndoLog) -> Vec<u16> {
        let due: Vec<FeatureActivation> = self
            .features
            .values()
            .filter(|f| !f.completed && f.activation_block <= height)
            .cloned()
            .collect();

        due.into_iter()
            .map(|feature| {
                let feature_id = feature.feature_id;
                self.put(
                    FeatureActivation {
                        completed: true,
                        ..feature
                    },
                    undo,
                );
                feature_id
            })
            .collect()
    }

    pub fn restore(&mut self, feature_id: u16, previous: Option<FeatureActivation>) {
        match previous {
            Some(feature) => {
                self.features.insert(feature_id, feature);
            }
            None => {
                self.features.remove(&feature_id);
            }
        }
    }

    fn put(&mut self, feature: FeatureActivation, undo: &mut UndoLog) {
        let feature_id = feature.feature_id;
        let previous = self.features.insert(feature_id, feature);
        undo.push(UndoOp::Activation {
            feature_id,
            previous,
        });
    }
}
