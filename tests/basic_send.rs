mod common;

use common::{coins, send, Harness};
use metalayer_indexer::domain::errors::ProtocolError;
use metalayer_indexer::domain::models::{Balance, PROPERTY_MAIN_TOKEN};

#[tokio::test]
async fn test_simple_send_moves_tokens() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(100))]);

    let txid = h
        .submit("alice", Some("bob"), send(PROPERTY_MAIN_TOKEN, coins(30)))
        .await;
    h.mine().await;

    assert_eq!(h.balance("alice", PROPERTY_MAIN_TOKEN).await.available, coins(70));
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, coins(30));

    let record = h.record(&txid).await;
    assert!(record.valid);
    assert_eq!(record.type_name, "Simple Send");
    assert_eq!(record.tx_type, Some(0));
    assert_eq!(record.block_height, 1);
    assert_eq!(record.reference.as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_overdraft_is_invalid_and_changes_nothing() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(10))]);

    let txid = h
        .submit("alice", Some("bob"), send(PROPERTY_MAIN_TOKEN, coins(11)))
        .await;
    h.mine().await;

    let record = h.record(&txid).await;
    assert!(!record.valid);
    assert_eq!(
        record.invalid_reason,
        Some(ProtocolError::InsufficientBalance.to_string())
    );
    assert_eq!(h.balance("alice", PROPERTY_MAIN_TOKEN).await.available, coins(10));
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await, Balance::default());
}

#[tokio::test]
async fn test_invalid_sends_are_recorded_with_reasons() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(10))]);

    let unknown = h.submit("alice", Some("bob"), send(77, 1)).await;
    let zero = h
        .submit("alice", Some("bob"), send(PROPERTY_MAIN_TOKEN, 0))
        .await;
    let no_reference = h.submit("alice", None, send(PROPERTY_MAIN_TOKEN, 5)).await;
    let garbage = h.chain.submit_raw("alice", "0000", Some("bob")).await.unwrap();
    h.mine().await;

    assert_eq!(
        h.record(&unknown).await.invalid_reason,
        Some(ProtocolError::UnknownProperty(77).to_string())
    );
    assert_eq!(
        h.record(&zero).await.invalid_reason,
        Some(ProtocolError::InvalidAmount.to_string())
    );
    assert_eq!(
        h.record(&no_reference).await.invalid_reason,
        Some(ProtocolError::MissingReference.to_string())
    );
    let garbage = h.record(&garbage).await;
    assert!(!garbage.valid);
    assert!(garbage.payload.is_none());
    assert_eq!(h.balance("alice", PROPERTY_MAIN_TOKEN).await.available, coins(10));
}

#[tokio::test]
async fn test_transactions_apply_in_block_order() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(100))]);

    // bob only holds enough once the first send is applied
    let first = h
        .submit("alice", Some("bob"), send(PROPERTY_MAIN_TOKEN, coins(60)))
        .await;
    let second = h
        .submit("bob", Some("carol"), send(PROPERTY_MAIN_TOKEN, coins(50)))
        .await;
    let third = h
        .submit("bob", Some("carol"), send(PROPERTY_MAIN_TOKEN, coins(50)))
        .await;
    h.mine().await;

    assert!(h.record(&first).await.valid);
    assert!(h.record(&second).await.valid);
    assert!(!h.record(&third).await.valid);
    assert_eq!(h.record(&second).await.position, 1);
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, coins(10));
    assert_eq!(h.balance("carol", PROPERTY_MAIN_TOKEN).await.available, coins(50));
}
