//! Send-to-owners distribution
//!
//! Splits an amount across the holders of a property in proportion to their
//! available balances.

use crate::domain::models::StoRecipient;

/// Orders the holders of the distribution property and excludes the sender
pub fn eligible_owners(holders: Vec<(String, i64)>, sender: &str) -> Vec<(String, i64)> {
    let mut owners: Vec<(String, i64)> = holders
        .into_iter()
        .filter(|(address, balance)| address != sender && *balance > 0)
        .collect();
    owners.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    owners
}

/// Distributes `amount` over ordered owners.
///
/// Every owner first receives `floor(amount * balance / total)`. Units lost
/// to rounding go one at a time to owners in order. Owners that end up with
/// nothing are dropped from the result.
pub fn distribute(owners: &[(String, i64)], amount: i64) -> Vec<StoRecipient> {
    let total: i128 = owners.iter().map(|(_, b)| i128::from(*b)).sum();
    if total <= 0 || amount <= 0 {
        return Vec::new();
    }

    let mut shares: Vec<i64> = owners
        .iter()
        .map(|(_, balance)| (i128::from(amount) * i128::from(*balance) / total) as i64)
        .collect();

    let assigned: i64 = shares.iter().sum();
    let mut remainder = amount - assigned;
    for share in shares.iter_mut() {
        if remainder == 0 {
            break;
        }
        *share += 1;
        remainder -= 1;
    }

    owners
        .iter()
        .zip(shares)
        .filter(|(_, share)| *share > 0)
        .map(|((address, _), share)| StoRecipient {
            address: address.clone(),
            amount: share,
        })
        .collect()
}

/// Fee charged for a distribution, in the ecosystem's protocol token
pub fn distribution_fee(fee_per_recipient: i64, recipients: usize) -> i64 {
    fee_per_recipient.saturating_mul(recipients as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(list: &[(&str, i64)]) -> Vec<(String, i64)> {
        list.iter().map(|(a, b)| (a.to_string(), *b)).collect()
    }

    #[test]
    fn test_equal_split() {
        let list = eligible_owners(owners(&[("a", 1), ("b", 1), ("c", 1), ("s", 9)]), "s");
        let recipients = distribute(&list, 150);
        assert_eq!(recipients.len(), 3);
        assert!(recipients.iter().all(|r| r.amount == 50));
    }

    #[test]
    fn test_ordering_by_balance_then_address() {
        let list = eligible_owners(owners(&[("c", 5), ("a", 5), ("b", 10)]), "x");
        let addresses: Vec<&str> = list.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(addresses, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remainder_goes_to_first_owners() {
        let list = eligible_owners(owners(&[("a", 1), ("b", 1), ("c", 1)]), "x");
        let recipients = distribute(&list, 5);
        let amounts: Vec<i64> = recipients.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![2, 2, 1]);
    }

    #[test]
    fn test_zero_shares_are_dropped() {
        let list = eligible_owners(owners(&[("a", 100), ("b", 1), ("c", 1)]), "x");
        let recipients = distribute(&list, 1);
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].address, "a");
        assert_eq!(recipients[0].amount, 1);
    }

    #[test]
    fn test_total_is_preserved() {
        let list = eligible_owners(owners(&[("a", 7), ("b", 3), ("c", 13)]), "x");
        let recipients = distribute(&list, 1_000_003);
        let sum: i64 = recipients.iter().map(|r| r.amount).sum();
        assert_eq!(sum, 1_000_003);
    }

    #[test]
    fn test_no_owners() {
        assert!(distribute(&[], 10).is_empty());
        assert_eq!(distribution_fee(1, 2), 2);
    }
}
