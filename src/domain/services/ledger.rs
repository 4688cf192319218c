//! Balance ledger
//!
//! Maps (address, property) to available and reserved amounts. Empty
//! balances are removed so that equal states compare and serialize equally.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::errors::ProtocolError;
use crate::domain::models::{Balance, Ecosystem, PropertyId, UndoLog, UndoOp};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<String, BTreeMap<PropertyId, Balance>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, address: &str, property: PropertyId) -> Balance {
        self.balances
            .get(address)
            .and_then(|props| props.get(&property))
            .copied()
            .unwrap_or_default()
    }

    pub fn available(&self, address: &str, property: PropertyId) -> i64 {
        self.balance(address, property).available
    }

    pub fn reserved(&self, address: &str, property: PropertyId) -> i64 {
        self.balance(address, property).reserved
    }

    /// All non-empty balances of an address, ascending by property
    pub fn balances_of(&self, address: &str) -> Vec<(PropertyId, Balance)> {
        self.balances
            .get(address)
            .map(|props| props.iter().map(|(id, b)| (*id, *b)).collect())
            .unwrap_or_default()
    }

    /// Properties of one ecosystem where the address has a positive available balance
    pub fn available_in_ecosystem(
        &self,
        address: &str,
        ecosystem: Ecosystem,
    ) -> Vec<(PropertyId, i64)> {
        self.balances_of(address)
            .into_iter()
            .filter(|(id, b)| Ecosystem::of(*id) == Some(ecosystem) && b.available > 0)
            .map(|(id, b)| (id, b.available))
            .collect()
    }

    /// Addresses with a positive available balance of a property
    pub fn holders(&self, property: PropertyId) -> Vec<(String, i64)> {
        self.balances
            .iter()
            .filter_map(|(address, props)| {
                props
                    .get(&property)
                    .filter(|b| b.available > 0)
                    .map(|b| (address.clone(), b.available))
            })
            .collect()
    }

    /// Sum of available and reserved over all addresses
    pub fn total_for(&self, property: PropertyId) -> i128 {
        self.balances
            .values()
            .filter_map(|props| props.get(&property))
            .map(|b| i128::from(b.available) + i128::from(b.reserved))
            .sum()
    }

    /// Properties that have at least one balance entry
    pub fn known_properties(&self) -> Vec<PropertyId> {
        let mut ids: Vec<PropertyId> = self
            .balances
            .values()
            .flat_map(|props| props.keys().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Increase the available balance
    pub fn credit(
        &mut self,
        address: &str,
        property: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let current = self.balance(address, property);
        let available = current
            .available
            .checked_add(amount)
            .ok_or(ProtocolError::SupplyOverflow)?;
        self.set(address, property, Balance { available, ..current }, undo);
        Ok(())
    }

    /// Decrease the available balance, failing if it would go negative
    pub fn debit(
        &mut self,
        address: &str,
        property: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let current = self.balance(address, property);
        if current.available < amount {
            return Err(ProtocolError::InsufficientBalance);
        }
        let available = current.available - amount;
        self.set(address, property, Balance { available, ..current }, undo);
        Ok(())
    }

    /// Move an amount from available to reserved
    pub fn reserve(
        &mut self,
        address: &str,
        property: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let current = self.balance(address, property);
        if current.available < amount {
            return Err(ProtocolError::InsufficientBalance);
        }
        let next = Balance {
            available: current.available - amount,
            reserved: current
                .reserved
                .checked_add(amount)
                .ok_or(ProtocolError::SupplyOverflow)?,
        };
        self.set(address, property, next, undo);
        Ok(())
    }

    /// Move an amount from reserved back to available
    pub fn unreserve(
        &mut self,
        address: &str,
        property: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let current = self.balance(address, property);
        if current.reserved < amount {
            return Err(ProtocolError::InsufficientBalance);
        }
        let next = Balance {
            available: current
                .available
                .checked_add(amount)
                .ok_or(ProtocolError::SupplyOverflow)?,
            reserved: current.reserved - amount,
        };
        self.set(address, property, next, undo);
        Ok(())
    }

    /// Move reserved tokens of `from` to the available balance of `to`
    pub fn transfer_reserved(
        &mut self,
        from: &str,
        to: &str,
        property: PropertyId,
        amount: i64,
        undo: &mut UndoLog,
    ) -> Result<(), ProtocolError> {
        let current = self.balance(from, property);
        if current.reserved < amount {
            return Err(ProtocolError::InsufficientBalance);
        }
        let next = Balance {
            reserved: current.reserved - amount,
            ..current
        };
        self.set(from, property, next, undo);
        self.credit(to, property, amount, undo)
    }

    /// Restore a balance recorded in an undo log
    pub fn restore(&mut self, address: &str, property: PropertyId, previous: Balance) {
        self.write(address, property, previous);
    }

    fn set(&mut self, address: &str, property: PropertyId, next: Balance, undo: &mut UndoLog) {
        let previous = self.balance(address, property);
        if previous == next {
            return;
        }
        undo.push(UndoOp::Balance {
            address: address.to_string(),
            property,
            previous,
        });
        self.write(address, property, next);
    }

    fn write(&mut self, address: &str, property: PropertyId, next: Balance) {
        if next.is_empty() {
            if let Some(props) = self.balances.get_mut(address) {
                props.remove(&property);
                if props.is_empty() {
                    self.balances.remove(address);
                }
            }
            return;
        }
        self.balances
            .entry(address.to_string())
            .or_default()
            .insert(property, next);
    }
}
