//! Property registry
//!
//! Assigns property ids per ecosystem and tracks each property's metadata and
//! total supply. Supply changes always go together with a ledger change, so
//! the sum of all balances equals the registered total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ledger::Ledger;
use crate::domain::errors::ProtocolError;
use crate::domain::models::{
    Ecosystem, Property, PropertyId, PropertyKind, PropertyMetadata, UndoLog, UndoOp,
    MAIN_ECOSYSTEM_LAST_ID, MAX_TOKENS, PROPERTY_MAIN_TOKEN, PROPERTY_TEST_TOKEN,
};

/// Parameters of a new issuance
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub kind: PropertyKind,
    pub ecosystem: Ecosystem,
    pub divisible: bool,
    pub issuer: String,
    pub initial_amount: i64,
    pub metadata: PropertyMetadata,
    pub txid: String,
    pub block: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRegistry {
    properties: BTreeMap<PropertyId, Property>,
    next_main_id: PropertyId,
    next_test_id: PropertyId,
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyRegistry {
    /// Registry holding only the two protocol tokens
    pub fn new() -> Self {
        let protocol = |id: PropertyId, ecosystem: Ecosystem, name: &str| Property {
            id,
            ecosystem,
            divisible: true,
            issuer: String::new(),
            creation_txid: String::new(),
            creation_block: 0,
            total_tokens: 0,
            kind: PropertyKind::Protocol,
            metadata: PropertyMetadata {
                category: "N/A".to_string(),
                subcategory: "N/A".to_string(),
                name: name.to_string(),
                url: String::new(),
                data: "Protocol token".to_string(),
            },
        };

        let mut properties = BTreeMap::new();
        properties.insert(
            PROPERTY_MAIN_TOKEN,
            protocol(PROPERTY_MAIN_TOKEN, Ecosystem::Main, "Main Protocol Token"),
        );
        properties.insert(
            PROPERTY_TEST_TOKEN,
            protocol(PROPERTY_TEST_TOKEN, Ecosystem::Test, "Test Protocol Token"),
        );

        Self {
            properties,
            next_main_id: Ecosystem::Main.first_id(),
            next_test_id: Ecosystem::Test.first_id(),
        }
    }

    pub fn get(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(&id)
    }

    pub fn lookup(&self, id: PropertyId) -> Result<&Property, ProtocolError> {
        self.get(id).ok_or(ProtocolError::UnknownProperty(id))
    }

    pub fn exists(&self, id: PropertyId) -> bool {
        self.properties.contains_key(&id)
    }

    pub fn is_divisible(&self, id: PropertyId) -> bool {
        self.get(id).map(|p| p.divisible).unwrap_or(true)
    }

    pub fn list(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn next_id(&self, ecosystem: Ecosystem) -> PropertyId {
        match ecosystem {
            Ecosystem::Main => self.next_main_id,
            Ecosystem::Test => self.next_test_id,
        }
    }

    /// Create a property with the next free id of its ecosystem and credit the
    /// initial amount to the issuer
    pub fn issue(
        &mut self,
        ledger: &mut Ledger,
        request: IssueRequest,
        undo: &mut UndoLog,
    ) -> Result<PropertyId, ProtocolError> {
        if !(0..=MAX_TOKENS).contains(&request.initial_amount) {
            return Err(ProtocolError::InvalidAmount);
        }
        let id = self.next_id(request.ecosystem);
        let next = match request.ecosystem {
            Ecosystem::Main if id > MAIN_ECOSYSTEM_LAST_ID => {
                return Err(ProtocolError::InvalidEcosystem)
            }
            _ => id.checked_add(1).ok_or(ProtocolError::SupplyOverflow)?,
        };

        undo.push(UndoOp::PropertyCreated {
            property: id,
            ecosystem: request.ecosystem,
            previous_next_id: id,
        });
        match request.ecosystem {
            Ecosystem::Main => self.next_main_id = next,
            Ecosystem::Test => self.next_test_id = next,
        }

        self.properties.insert(
            id,
            Property {
                id,
                ecosystem: request.ecosystem,
                divisible: request.divisible,
                issuer: request.issuer.clone(),
                creation_txid: request.txid,
                creation_block: request.block,
                total_tokens: 0,
                kind: request.kind,
                metadata: request.metadata,
            },
        );

        if request.initial_amount > 0 {
            self.mint(ledger, &request.issuer, id, request.initial_amount, undo)?;
        }
        Ok(id)
    }

    /// Grant new tokens of a managed property; only the issuer may grant
    pub fn grant(
        &mut self,
        ledger: &mut Ledger,
        sender: &str,
        id: PropertyId,
        amount: i64,
        recipient: &str,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        self.check_managed_issuer(sender, id)?;
        self.mint(ledger, recipient, id, amount, undo)
    }

    /// Revoke tokens of a managed property from the issuer's available balance
    pub fn revoke(
        &mut self,
        ledger: &mut Ledger,
        sender: &str,
        id: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        self.check_managed_issuer(sender, id)?;
        self.burn(ledger, sender, id, amount, undo)
    }

    /// Create tokens out of nothing, rejecting supply overflow
    pub fn mint(
        &mut self,
        ledger: &mut Ledger,
        recipient: &str,
        id: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        if amount <= 0 {
            return Err(ProtocolError::InvalidAmount);
        }
        let property = self
            .properties
            .get_mut(&id)
            .ok_or(ProtocolError::UnknownProperty(id))?;
        let total = property
            .total_tokens
            .checked_add(amount)
            .ok_or(ProtocolError::SupplyOverflow)?;
        undo.push(UndoOp::Supply {
            property: id,
            previous: property.total_tokens,
        });
        property.total_tokens = total;
        ledger.credit(recipient, id, amount, undo)
    }

    /// Destroy tokens from an available balance
    pub fn burn(
        &mut self,
        ledger: &mut Ledger,
        holder: &str,
        id: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        if amount <= 0 {
            return Err(ProtocolError::InvalidAmount);
        }
        let property = self
            .properties
            .get_mut(&id)
            .ok_or(ProtocolError::UnknownProperty(id))?;
        ledger.debit(holder, id, amount, undo)?;
        undo.push(UndoOp::Supply {
            property: id,
            previous: property.total_tokens,
        });
        property.total_tokens -= amount;
        Ok(())
    }

    fn check_managed_issuer(&self, sender: &str, id: PropertyId) -> Result<(), ProtocolError> {
        let property = self.lookup(id)?;
        if !property.is_managed() {
            return Err(ProtocolError::NotManaged);
        }
        if property.issuer != sender {
            return Err(ProtocolError::NotIssuer);
        }
        Ok(())
    }

    /// Undo a supply change
    pub fn restore_supply(&mut self, id: PropertyId, previous: i64) {
        if let Some(property) = self.properties.get_mut(&id) {
            property.total_tokens = previous;
        }
    }

    /// Undo an issuance: the property disappears and its id becomes free again
    pub fn remove_created(
        &mut self,
        id: PropertyId,
        ecosystem: Ecosystem,
        previous_next_id: PropertyId,
    ) {
        self.properties.remove(&id);
        match ecosystem {
            Ecosystem::Main => self.next_main_id = previous_next_id,
            Ecosystem::Test => self.next_test_id = previous_next_id,
        }
    }
}
