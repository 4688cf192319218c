mod common;

use common::{activation, coins, fixed_issuance, Harness, ADMIN};
use metalayer_indexer::domain::errors::ProtocolError;
use metalayer_indexer::domain::models::{OfferAction, PROPERTY_MAIN_TOKEN};
use metalayer_indexer::domain::services::activation::FEATURE_FREE_DEX;
use metalayer_indexer::domain::services::payload::Payload;

fn offer(property: u32, amount: i64, desired: i64, action: OfferAction) -> Payload {
    Payload::DexSellOffer {
        property,
        amount: amount as u64,
        desired: desired as u64,
        time_limit: 10,
        min_fee: 10_000,
        action,
    }
}

fn accept(amount: i64) -> Payload {
    Payload::DexAcceptOffer {
        property: PROPERTY_MAIN_TOKEN,
        amount: amount as u64,
    }
}

#[tokio::test]
async fn test_offer_lifecycle() {
    let mut h = Harness::new(&[("seller", PROPERTY_MAIN_TOKEN, coins(10))]);

    let created = h
        .submit(
            "seller",
            None,
            offer(PROPERTY_MAIN_TOKEN, coins(4), 2_000_000, OfferAction::New),
        )
        .await;
    let duplicate = h
        .submit(
            "seller",
            None,
            offer(PROPERTY_MAIN_TOKEN, coins(1), 100, OfferAction::New),
        )
        .await;
    h.mine().await;

    assert!(h.record(&created).await.valid);
    assert_eq!(
        h.record(&duplicate).await.invalid_reason,
        Some(ProtocolError::DuplicateActiveOffer.to_string())
    );
    let balance = h.balance("seller", PROPERTY_MAIN_TOKEN).await;
    assert_eq!(balance.available, coins(6));
    assert_eq!(balance.reserved, coins(4));

    let partial = h.submit("buyer", Some("seller"), accept(coins(1))).await;
    let too_much = h.submit("buyer", Some("seller"), accept(coins(4))).await;
    let own = h.submit("seller", Some("seller"), accept(coins(1))).await;
    h.mine().await;

    assert!(h.record(&partial).await.valid);
    assert_eq!(
        h.record(&too_much).await.invalid_reason,
        Some(ProtocolError::OfferAmountExceeded.to_string())
    );
    assert_eq!(
        h.record(&own).await.invalid_reason,
        Some(ProtocolError::SelfAccept.to_string())
    );
    assert_eq!(h.balance("buyer", PROPERTY_MAIN_TOKEN).await.available, coins(1));
    let offers = h.queries.active_offers().await;
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].amount_remaining, coins(3));
    assert_eq!(offers[0].desired_remaining, 1_500_000);
    assert_eq!(offers[0].amount_offered, coins(4));

    h.submit(
        "seller",
        None,
        offer(PROPERTY_MAIN_TOKEN, coins(2), 1_000_000, OfferAction::Update),
    )
    .await;
    h.mine().await;
    let balance = h.balance("seller", PROPERTY_MAIN_TOKEN).await;
    assert_eq!(balance.available, coins(7));
    assert_eq!(balance.reserved, coins(2));

    let rest = h.submit("buyer", Some("seller"), accept(coins(2))).await;
    h.mine().await;
    assert!(h.record(&rest).await.valid);
    assert!(h.queries.active_offers().await.is_empty());
    assert_eq!(h.balance("buyer", PROPERTY_MAIN_TOKEN).await.available, coins(3));
    assert_eq!(h.balance("seller", PROPERTY_MAIN_TOKEN).await.reserved, 0);
}

#[tokio::test]
async fn test_cancel_releases_reservation() {
    let mut h = Harness::new(&[("seller", PROPERTY_MAIN_TOKEN, coins(10))]);
    let missing = h
        .submit(
            "seller",
            None,
            offer(PROPERTY_MAIN_TOKEN, 0, 0, OfferAction::Cancel),
        )
        .await;
    h.submit(
        "seller",
        None,
        offer(PROPERTY_MAIN_TOKEN, coins(5), 5_000, OfferAction::New),
    )
    .await;
    h.mine().await;
    assert_eq!(
        h.record(&missing).await.invalid_reason,
        Some(ProtocolError::NoActiveOffer.to_string())
    );

    h.submit(
        "seller",
        None,
        offer(PROPERTY_MAIN_TOKEN, 0, 0, OfferAction::Cancel),
    )
    .await;
    h.mine().await;

    let balance = h.balance("seller", PROPERTY_MAIN_TOKEN).await;
    assert_eq!(balance.available, coins(10));
    assert_eq!(balance.reserved, 0);
    assert!(h.queries.active_offers().await.is_empty());
}

#[tokio::test]
async fn test_offer_needs_balance() {
    let mut h = Harness::new(&[("seller", PROPERTY_MAIN_TOKEN, coins(1))]);
    let txid = h
        .submit(
            "seller",
            None,
            offer(PROPERTY_MAIN_TOKEN, coins(2), 1_000, OfferAction::New),
        )
        .await;
    h.mine().await;
    assert!(!h.record(&txid).await.valid);
    assert_eq!(h.balance("seller", PROPERTY_MAIN_TOKEN).await.reserved, 0);
}

#[tokio::test]
async fn test_other_properties_need_free_dex() {
    let mut h = Harness::new(&[]);
    h.submit("seller", None, fixed_issuance(1, true, "Widget", coins(50)))
        .await;
    h.mine().await;

    let early = h
        .submit("seller", None, offer(3, coins(5), 1_000, OfferAction::New))
        .await;
    h.submit(ADMIN, None, activation(FEATURE_FREE_DEX, 7)).await;
    h.mine().await;
    assert_eq!(
        h.record(&early).await.invalid_reason,
        Some(ProtocolError::PropertyNotTradeable(3).to_string())
    );

    h.mine_until(7).await;
    let txid = h
        .submit("seller", None, offer(3, coins(5), 1_000, OfferAction::New))
        .await;
    h.mine().await;
    assert!(h.record(&txid).await.valid);
    assert_eq!(h.balance("seller", 3).await.reserved, coins(5));
}
