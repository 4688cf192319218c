mod common;

use common::{coins, fixed_issuance, Harness};
use metalayer_indexer::domain::errors::ProtocolError;
use metalayer_indexer::domain::models::{
    OfferAction, SubSend, PROPERTY_MAIN_TOKEN, PROPERTY_TEST_TOKEN,
};
use metalayer_indexer::domain::services::payload::Payload;

#[tokio::test]
async fn test_send_all_moves_one_ecosystem() {
    let mut h = Harness::new(&[
        ("alice", PROPERTY_MAIN_TOKEN, coins(5)),
        ("alice", PROPERTY_TEST_TOKEN, coins(7)),
    ]);
    h.submit("alice", None, fixed_issuance(1, false, "Main Thing", 40))
        .await;
    // part of the protocol token sits in an offer and must stay put
    h.submit(
        "alice",
        None,
        Payload::DexSellOffer {
            property: PROPERTY_MAIN_TOKEN,
            amount: coins(1) as u64,
            desired: 1_000,
            time_limit: 10,
            min_fee: 0,
            action: OfferAction::New,
        },
    )
    .await;
    h.mine().await;

    let txid = h
        .submit("alice", Some("bob"), Payload::SendAll { ecosystem: 1 })
        .await;
    h.mine().await;

    let record = h.record(&txid).await;
    assert!(record.valid, "{:?}", record.invalid_reason);
    assert_eq!(
        record.details.sub_sends,
        vec![
            SubSend {
                property_id: PROPERTY_MAIN_TOKEN,
                amount: coins(4),
            },
            SubSend {
                property_id: 3,
                amount: 40,
            },
        ]
    );
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, coins(4));
    assert_eq!(h.balance("bob", 3).await.available, 40);
    assert_eq!(h.balance("alice", PROPERTY_MAIN_TOKEN).await.reserved, coins(1));
    assert_eq!(h.balance("alice", PROPERTY_MAIN_TOKEN).await.available, 0);
    assert_eq!(h.balance("alice", PROPERTY_TEST_TOKEN).await.available, coins(7));
    assert_eq!(h.balance("bob", PROPERTY_TEST_TOKEN).await.available, 0);
}

#[tokio::test]
async fn test_send_all_with_nothing_to_send() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(5))]);

    let empty = h
        .submit("alice", Some("bob"), Payload::SendAll { ecosystem: 2 })
        .await;
    let no_reference = h
        .submit("alice", None, Payload::SendAll { ecosystem: 1 })
        .await;
    h.mine().await;

    assert_eq!(
        h.record(&empty).await.invalid_reason,
        Some(ProtocolError::NothingToSend.to_string())
    );
    assert_eq!(
        h.record(&no_reference).await.invalid_reason,
        Some(ProtocolError::MissingReference.to_string())
    );
    assert_eq!(h.balance("alice", PROPERTY_MAIN_TOKEN).await.available, coins(5));
}
