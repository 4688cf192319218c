//! Crowdsale engine
//!
//! Tracks token sales and computes how many tokens a contribution mints.
//! All arithmetic is integer; intermediate products use 128 bits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::errors::ProtocolError;
use crate::domain::models::{
    Crowdsale, CrowdsaleParticipation, PropertyId, UndoLog, UndoOp, COIN, MAX_TOKENS,
};

/// Fixed-point precision of the early-bonus percentage
const BONUS_PRECISION: u128 = 1_000_000_000_000;

/// Inputs of a purchase calculation
#[derive(Debug, Clone, Copy)]
pub struct PurchaseInput {
    /// Raw amount of the desired property paid
    pub amount_paid: i64,
    pub desired_divisible: bool,
    pub tokens_per_unit: i64,
    pub early_bonus: u8,
    pub issuer_percent: u8,
    pub deadline: i64,
    pub block_time: i64,
    pub bonus_period_secs: i64,
    /// Tokens of the sale property already in existence
    pub total_tokens: i64,
}

/// Tokens minted by one contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseQuote {
    pub participant_tokens: i64,
    pub issuer_tokens: i64,
    /// The supply ceiling was hit and the amounts were cut back
    pub reached_cap: bool,
}

/// Compute participant and issuer tokens for a contribution.
///
/// `base = paid * rate / unit`, truncated, where `unit` is one whole token of
/// the desired property. The early bonus decays linearly with the remaining
/// time until the deadline. When the result would push the supply past the
/// ceiling, the remaining supply is split pro rata and the rounding remainder
/// goes to the participant.
pub fn calculate_purchase(input: PurchaseInput) -> PurchaseQuote {
    let paid = input.amount_paid.max(0) as u128;
    let rate = input.tokens_per_unit.max(0) as u128;
    let unit: u128 = if input.desired_divisible { COIN as u128 } else { 1 };

    let base = paid.saturating_mul(rate) / unit;

    let bonus_scaled: u128 = if input.block_time < input.deadline && input.bonus_period_secs > 0 {
        let remaining = (input.deadline - input.block_time) as u128;
        u128::from(input.early_bonus)
            .saturating_mul(remaining)
            .saturating_mul(BONUS_PRECISION)
            / input.bonus_period_secs as u128
    } else {
        0
    };

    let hundred = 100 * BONUS_PRECISION;
    let participant = base
        .checked_mul(hundred.saturating_add(bonus_scaled))
        .map(|v| v / hundred)
        .unwrap_or(u128::MAX);
    let issuer = participant.saturating_mul(u128::from(input.issuer_percent)) / 100;

    let remaining_supply = (MAX_TOKENS - input.total_tokens.clamp(0, MAX_TOKENS)) as u128;
    let created = participant.saturating_add(issuer);

    if created <= remaining_supply {
        return PurchaseQuote {
            participant_tokens: participant as i64,
            issuer_tokens: issuer as i64,
            reached_cap: false,
        };
    }

    // Split what is left in the participant:issuer ratio of 100:percent
    let pct = u128::from(input.issuer_percent);
    let capped_issuer = remaining_supply * pct / (100 + pct);
    let capped_participant = remaining_supply - capped_issuer;

    PurchaseQuote {
        participant_tokens: capped_participant as i64,
        issuer_tokens: capped_issuer as i64,
        reached_cap: true,
    }
}

/// All crowdsales ever created, active or closed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsaleBook {
    sales: BTreeMap<PropertyId, Crowdsale>,
    participations: BTreeMap<PropertyId, Vec<CrowdsaleParticipation>>,
}

impl CrowdsaleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: PropertyId) -> Option<&Crowdsale> {
        self.sales.get(&property)
    }

    pub fn all(&self) -> impl Iterator<Item = &Crowdsale> {
        self.sales.values()
    }

    pub fn active(&self) -> impl Iterator<Item = &Crowdsale> {
        self.sales.values().filter(|s| s.active)
    }

    pub fn active_for_issuer(&self, issuer: &str) -> Option<&Crowdsale> {
        self.active().find(|s| s.issuer == issuer)
    }

    pub fn participations(&self, property: PropertyId) -> &[CrowdsaleParticipation] {
        self.participations
            .get(&property)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Sale receiving a payment of `property` sent to `recipient`, if any
    pub fn contribution_target(&self, recipient: &str, property: PropertyId) -> Option<&Crowdsale> {
        self.active_for_issuer(recipient)
            .filter(|s| s.desired_property == property)
    }

    /// Register a new sale; an issuer may only run one at a time
    pub fn create(&mut self, sale: Crowdsale, undo: &mut UndoLog) -> Result<(), ProtocolError> {
        if self.active_for_issuer(&sale.issuer).is_some() {
            return Err(ProtocolError::ActiveCrowdsaleExists);
        }
        self.put(sale, undo);
        Ok(())
    }

    /// Close a sale on request of its issuer
    pub fn close(
        &mut self,
        sender: &str,
        property: PropertyId,
        txid: &str,
        block: u32,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let sale = self.get(property).ok_or(ProtocolError::NotCrowdsale)?;
        if sale.issuer != sender {
            return Err(ProtocolError::NotIssuer);
        }
        if !sale.active {
            return Err(ProtocolError::CrowdsaleNotActive);
        }
        let mut next = sale.clone();
        next.active = false;
        next.close_txid = Some(txid.to_string());
        next.close_block = Some(block);
        self.put(next, undo);
        Ok(())
    }

    /// Account a contribution and close the sale if it hit the supply ceiling
    pub fn record_purchase(
        &mut self,
        property: PropertyId,
        quote: PurchaseQuote,
        participation: CrowdsaleParticipation,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let sale = self.get(property).ok_or(ProtocolError::NotCrowdsale)?;
        let mut next = sale.clone();
        next.tokens_issued = next
            .tokens_issued
            .checked_add(quote.participant_tokens)
            .ok_or(ProtocolError::SupplyOverflow)?;
        next.issuer_tokens = next
            .issuer_tokens
            .checked_add(quote.issuer_tokens)
            .ok_or(ProtocolError::SupplyOverflow)?;
        if quote.reached_cap {
            next.active = false;
            next.closed_early = true;
            next.max_tokens = true;
            next.close_txid = Some(participation.txid.clone());
            next.close_block = Some(participation.block);
        }
        self.put(next, undo);

        undo.push(UndoOp::Participation { property });
        self.participations
            .entry(property)
            .or_default()
            .push(participation);
        Ok(())
    }

    /// Close every active sale whose deadline passed before `block_time`
    pub fn expire(&mut self, block_time: i64, block: u32, undo: &mut UndoLog) -> Vec<PropertyId> {
        let expired: Vec<PropertyId> = self
            .active()
            .filter(|s| block_time > s.deadline)
            .map(|s| s.property_id)
            .collect();
        for id in &expired {
            if let Some(sale) = self.get(*id) {
                let mut next = sale.clone();
                next.active = false;
                next.close_block = Some(block);
                self.put(next, undo);
            }
        }
        expired
    }

    pub fn restore(&mut self, property: PropertyId, previous: Option<Crowdsale>) {
        match previous {
            Some(sale) => {
                self.sales.insert(property, sale);
            }
            None => {
                self.sales.remove(&property);
            }
        }
    }

    pub fn pop_participation(&mut self, property: PropertyId) {
        if let Some(list) = self.participations.get_mut(&property) {
            list.pop();
            if list.is_empty() {
                self.participations.remove(&property);
            }
        }
    }

    fn put(&mut self, sale: Crowdsale, undo: &mut UndoLog) {
        let property = sale.property_id;
        let previous = self.sales.insert(property, sale);
        undo.push(UndoOp::Crowdsale { property, previous });
    }
}
