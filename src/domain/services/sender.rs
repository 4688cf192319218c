//! Sender and reference selection for host chain transactions

use std::collections::BTreeMap;

/// One output of a host chain transaction as seen by the selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCandidate {
    /// Destination address, `None` for non-standard scripts
    pub address: Option<String>,
    /// Output carrying the protocol payload
    pub is_marker: bool,
}

/// Picks the input address with the highest summed value.
/// Equal sums resolve to the smallest address.
pub fn sender_by_contribution(inputs: &[(String, u64)]) -> Option<String> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for (address, value) in inputs {
        let entry = totals.entry(address.as_str()).or_insert(0);
        *entry = entry.saturating_add(*value);
    }

    // BTreeMap iterates ascending, so a strict comparison keeps the smallest address on ties
    let mut best: Option<(&str, u64)> = None;
    for (address, total) in totals {
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((address, total)),
        }
    }
    best.map(|(address, _)| address.to_string())
}

/// Picks the reference address: the first non-marker output not paying back
/// to the sender, otherwise the last output with an address.
pub fn select_reference(outputs: &[OutputCandidate], sender: &str) -> Option<String> {
    let first_foreign = outputs.iter().find_map(|out| match &out.address {
        Some(address) if !out.is_marker && address != sender => Some(address.clone()),
        _ => None,
    });
    first_foreign.or_else(|| {
        outputs
            .iter()
            .rev()
            .filter(|out| !out.is_marker)
            .find_map(|out| out.address.clone())
    })
}
