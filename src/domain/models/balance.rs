use serde::{Deserialize, Serialize};

/// Tokens held by one address in one property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Spendable amount
    pub available: i64,
    /// Amount escrowed by an open DEx offer
    pub reserved: i64,
}

impl Balance {
    pub fn total(&self) -> i64 {
        self.available.saturating_add(self.reserved)
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0 && self.reserved == 0
    }
}
