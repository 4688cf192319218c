//! DEx order book
//!
//! Sell offers of a property against the host chain's native coin. An offer
//! reserves the seller's tokens; accepts hand reserved tokens to the buyer
//! while the coin payment settles on the host chain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ledger::Ledger;
use crate::domain::errors::ProtocolError;
use crate::domain::models::{DexOffer, PropertyId, UndoLog, UndoOp};

/// Terms of a new or updated offer
#[derive(Debug, Clone)]
pub struct OfferTerms {
    pub amount: i64,
    pub desired: i64,
    pub time_limit: u8,
    pub min_fee: i64,
    pub txid: String,
    pub block: u32,
}

/// Result of a matched accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptOutcome {
    pub amount: i64,
    /// Native coin the buyer owes the seller
    pub desired: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexBook {
    offers: BTreeMap<String, BTreeMap<PropertyId, DexOffer>>,
}

impl DexBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, seller: &str, property: PropertyId) -> Option<&DexOffer> {
        self.offers.get(seller).and_then(|m| m.get(&property))
    }

    /// Open offers ordered by seller, then property
    pub fn active(&self) -> Vec<&DexOffer> {
        self.offers.values().flat_map(|m| m.values()).collect()
    }

    /// Open a new offer and reserve the amount for sale
    pub fn create(
        &mut self,
        ledger: &mut Ledger,
        seller: &str,
        property: PropertyId,
        terms: OfferTerms,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        if self.get(seller, property).is_some() {
            return Err(ProtocolError::DuplicateActiveOffer);
        }
        ledger.reserve(seller, property, terms.amount, undo)?;
        self.put(
            DexOffer {
                seller: seller.to_string(),
                property_id: property,
                amount_offered: terms.amount,
                amount_remaining: terms.amount,
                desired_offered: terms.desired,
                desired_remaining: terms.desired,
                time_limit: terms.time_limit,
                min_fee: terms.min_fee,
                txid: terms.txid,
                block: terms.block,
            },
            undo,
        );
        Ok(())
    }

    /// Replace the terms of an existing offer, re-reserving the difference
    pub fn update(
        &mut self,
        ledger: &mut Ledger,
        seller: &str,
        property: PropertyId,
        terms: OfferTerms,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let existing = self
            .get(seller, property)
            .ok_or(ProtocolError::NoActiveOffer)?
            .clone();
        ledger.unreserve(seller, property, existing.amount_remaining, undo)?;
        ledger.reserve(seller, property, terms.amount, undo)?;
        self.put(
            DexOffer {
                amount_offered: terms.amount,
                amount_remaining: terms.amount,
                desired_offered: terms.desired,
                desired_remaining: terms.desired,
                time_limit: terms.time_limit,
                min_fee: terms.min_fee,
                txid: terms.txid,
                block: terms.block,
                ..existing
            },
            undo,
        );
        Ok(())
    }

    /// Withdraw an offer and release what is still reserved
    pub fn cancel(
        &mut self,
        ledger: &mut Ledger,
        seller: &str,
        property: PropertyId,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let existing = self
            .get(seller, property)
            .ok_or(ProtocolError::NoActiveOffer)?
            .clone();
        ledger.unreserve(seller, property, existing.amount_remaining, undo)?;
        self.remove(seller, property, undo);
        Ok(())
    }

    /// Match a buyer against a seller's offer for an exact amount
    pub fn accept(
        &mut self,
        ledger: &mut Ledger,
        buyer: &str,
        seller: &str,
        property: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<AcceptOutcome, ProtocolError> {
        if buyer == seller {
            return Err(ProtocolError::SelfAccept);
        }
        let existing = self
            .get(seller, property)
            .ok_or(ProtocolError::NoActiveOffer)?
            .clone();
        if amount > existing.amount_remaining {
            return Err(ProtocolError::OfferAmountExceeded);
        }

        let desired = (i128::from(existing.desired_remaining) * i128::from(amount)
            / i128::from(existing.amount_remaining)) as i64;
        ledger.transfer_reserved(seller, buyer, property, amount, undo)?;

        let amount_remaining = existing.amount_remaining - amount;
        if amount_remaining == 0 {
            self.remove(seller, property, undo);
        } else {
            self.put(
                DexOffer {
                    amount_remaining,
                    desired_remaining: existing.desired_remaining - desired,
                    ..existing
                },
                undo,
            );
        }
        Ok(AcceptOutcome { amount, desired })
    }

    pub fn restore(&mut self, seller: &str, property: PropertyId, previous: Option<DexOffer>) {
        match previous {
            Some(offer) => {
                self.offers
                    .entry(seller.to_string())
                    .or_default()
                    .insert(property, offer);
            }
            None => self.delete(seller, property),
        }
    }

    fn put(&mut self, offer: DexOffer, undo: &mut UndoLog) {
        let seller = offer.seller.clone();
        let property = offer.property_id;
        let previous = self
            .offers
            .entry(seller.clone())
            .or_default()
            .insert(property, offer);
        undo.push(UndoOp::Offer {
            seller,
            property,
            previous,
        });
    }

    fn remove(&mut self, seller: &str, property: PropertyId, undo: &mut UndoLog) {
        let previous = self.get(seller, property).cloned();
        self.delete(seller, property);
        undo.push(UndoOp::Offer {
            seller: seller.to_string(),
            property,
            previous,
        });
    }

    fn delete(&mut self, seller: &str, property: PropertyId) {
        if let Some(m) = self.offers.get_mut(seller) {
            m.remove(&property);
            if m.is_empty() {
                self.offers.remove(seller);
            }
        }
    }
}
