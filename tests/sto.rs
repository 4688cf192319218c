mod common;

use common::{activation, coins, fixed_issuance, send, Harness, ADMIN};
use metalayer_indexer::domain::errors::ProtocolError;
use metalayer_indexer::domain::models::PROPERTY_MAIN_TOKEN;
use metalayer_indexer::domain::services::activation::FEATURE_STO_V1;
use metalayer_indexer::domain::services::payload::Payload;

fn sto(property: u32, amount: u64) -> Payload {
    Payload::SendToOwners {
        property,
        amount,
        distribution_property: None,
    }
}

#[tokio::test]
async fn test_equal_holders_share_evenly() {
    let mut h = Harness::new(&[
        ("alice", PROPERTY_MAIN_TOKEN, coins(10)),
        ("bob", PROPERTY_MAIN_TOKEN, 100),
        ("carol", PROPERTY_MAIN_TOKEN, 100),
        ("dave", PROPERTY_MAIN_TOKEN, 100),
    ]);

    let txid = h.submit("alice", None, sto(PROPERTY_MAIN_TOKEN, 150)).await;
    h.mine().await;

    let record = h.record(&txid).await;
    assert!(record.valid, "{:?}", record.invalid_reason);
    assert_eq!(record.details.sto_recipients, Some(3));
    assert_eq!(record.details.sto_fee, Some(3));
    for owner in ["bob", "carol", "dave"] {
        assert_eq!(h.balance(owner, PROPERTY_MAIN_TOKEN).await.available, 150);
    }
    // amount plus one unit of fee per recipient, the fee is burned
    assert_eq!(
        h.balance("alice", PROPERTY_MAIN_TOKEN).await.available,
        coins(10) - 153
    );
    assert_eq!(
        h.queries.property_info(PROPERTY_MAIN_TOKEN).await.unwrap().total_tokens,
        coins(10) + 300 - 3
    );

    let receipt = h.queries.sto_info(&txid).await.unwrap();
    assert_eq!(receipt.recipients.len(), 3);
    assert_eq!(receipt.fee_property, PROPERTY_MAIN_TOKEN);
    assert!(receipt.recipients.iter().all(|r| r.amount == 50));
}

#[tokio::test]
async fn test_rounding_remainder_goes_to_largest_holders() {
    let mut h = Harness::new(&[("issuer", PROPERTY_MAIN_TOKEN, coins(1))]);
    h.submit("issuer", None, fixed_issuance(1, false, "Shares", 100))
        .await;
    h.mine().await;
    h.submit("issuer", Some("bob"), send(3, 50)).await;
    h.submit("issuer", Some("carol"), send(3, 30)).await;
    h.submit("issuer", Some("dave"), send(3, 10)).await;
    h.mine().await;

    let txid = h.submit("issuer", None, sto(3, 7)).await;
    h.mine().await;

    // floor shares 3, 2, 0 and two leftover units to bob and carol
    let receipt = h.queries.sto_info(&txid).await.unwrap();
    let paid: Vec<(&str, i64)> = receipt
        .recipients
        .iter()
        .map(|r| (r.address.as_str(), r.amount))
        .collect();
    assert_eq!(paid, vec![("bob", 4), ("carol", 3)]);
    assert_eq!(receipt.fee, 2);
    assert_eq!(h.balance("dave", 3).await.available, 10);
    assert_eq!(h.balance("issuer", 3).await.available, 3);
    assert_eq!(
        h.balance("issuer", PROPERTY_MAIN_TOKEN).await.available,
        coins(1) - 2
    );
}

#[tokio::test]
async fn test_distribution_failures() {
    let mut h = Harness::new(&[
        ("alone", PROPERTY_MAIN_TOKEN, 500),
        ("poor", PROPERTY_MAIN_TOKEN, 100),
    ]);
    h.submit("poor", None, fixed_issuance(1, false, "Poor Shares", 10))
        .await;
    h.mine().await;
    h.submit("poor", Some("friend"), send(3, 5)).await;
    h.mine().await;

    // "poor" is the only other holder of the protocol token
    let too_much = h.submit("alone", None, sto(PROPERTY_MAIN_TOKEN, 501)).await;
    // enough to distribute, nothing left for the fee
    let no_fee = h.submit("alone", None, sto(PROPERTY_MAIN_TOKEN, 500)).await;
    let friend_without_fee = h.submit("friend", None, sto(3, 5)).await;
    h.mine().await;

    assert_eq!(
        h.record(&too_much).await.invalid_reason,
        Some(ProtocolError::InsufficientBalance.to_string())
    );
    assert_eq!(
        h.record(&no_fee).await.invalid_reason,
        Some(ProtocolError::InsufficientFee.to_string())
    );
    // "poor" would receive the shares, but "friend" holds no protocol token
    assert_eq!(
        h.record(&friend_without_fee).await.invalid_reason,
        Some(ProtocolError::InsufficientFee.to_string())
    );
    assert_eq!(h.balance("alone", PROPERTY_MAIN_TOKEN).await.available, 500);
}

#[tokio::test]
async fn test_no_owners_to_pay() {
    let mut h = Harness::new(&[("solo", PROPERTY_MAIN_TOKEN, 500)]);
    let txid = h.submit("solo", None, sto(PROPERTY_MAIN_TOKEN, 10)).await;
    h.mine().await;
    assert_eq!(
        h.record(&txid).await.invalid_reason,
        Some(ProtocolError::NoRecipients.to_string())
    );
}

#[tokio::test]
async fn test_cross_property_distribution_needs_feature() {
    let mut h = Harness::new(&[("payer", PROPERTY_MAIN_TOKEN, coins(1))]);
    h.submit("payer", None, fixed_issuance(1, false, "Shares", 100))
        .await;
    h.mine().await;
    h.submit("payer", Some("bob"), send(3, 60)).await;
    h.submit("payer", Some("carol"), send(3, 40)).await;
    h.mine().await;

    let cross = Payload::SendToOwners {
        property: PROPERTY_MAIN_TOKEN,
        amount: 1_000,
        distribution_property: Some(3),
    };
    let early = h.submit("payer", None, cross.clone()).await;
    h.submit(ADMIN, None, activation(FEATURE_STO_V1, 8)).await;
    h.mine().await;
    assert_eq!(
        h.record(&early).await.invalid_reason,
        Some(ProtocolError::FeatureNotActivated(FEATURE_STO_V1).to_string())
    );

    h.mine_until(8).await;
    let txid = h.submit("payer", None, cross).await;
    h.mine().await;

    assert!(h.record(&txid).await.valid);
    assert_eq!(h.record(&txid).await.version, Some(1));
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, 600);
    assert_eq!(h.balance("carol", PROPERTY_MAIN_TOKEN).await.available, 400);
    let receipt = h.queries.sto_info(&txid).await.unwrap();
    assert_eq!(receipt.distribution_property, 3);
    assert_eq!(receipt.fee, 2);
}
