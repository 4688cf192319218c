mod common;

use common::{coins, fixed_issuance, metadata, send, Harness, GENESIS_TIME};
use metalayer_indexer::application::engine::REORGANIZED_REASON;
use metalayer_indexer::application::indexer::{ChainProcessor, SyncOutcome};
use metalayer_indexer::config::{ConsensusParams, EngineConfig, GenesisAllocation, Network};
use metalayer_indexer::domain::errors::{BlockProcessorError, EngineError};
use metalayer_indexer::domain::models::PROPERTY_MAIN_TOKEN;
use metalayer_indexer::domain::services::payload::Payload;

#[tokio::test]
async fn test_reorg_replaces_double_spend() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(30))]);
    let to_bob = h
        .submit("alice", Some("bob"), send(PROPERTY_MAIN_TOKEN, coins(30)))
        .await;
    h.mine().await;
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, coins(30));
    let stale_hash = h.engine.read().await.tip().unwrap().hash.clone();

    // the competing branch spends the same tokens elsewhere and is longer
    h.chain.invalidate_tip().await.unwrap();
    h.chain.clear_pool().await;
    let to_carol = h
        .submit("alice", Some("carol"), send(PROPERTY_MAIN_TOKEN, coins(30)))
        .await;
    h.chain.mine_block_with_time(GENESIS_TIME + 700).await;
    h.chain.mine_block().await;

    let outcome = h.sync().await;
    assert_eq!(
        outcome,
        SyncOutcome {
            rolled_back: 1,
            applied: 2,
        }
    );

    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, 0);
    assert_eq!(h.balance("carol", PROPERTY_MAIN_TOKEN).await.available, coins(30));
    assert_eq!(h.balance("alice", PROPERTY_MAIN_TOKEN).await.available, 0);

    let orphaned = h.record(&to_bob).await;
    assert!(!orphaned.valid);
    assert_eq!(orphaned.invalid_reason.as_deref(), Some(REORGANIZED_REASON));
    assert_eq!(orphaned.block_hash, stale_hash);
    assert!(h.record(&to_carol).await.valid);

    let tip = h.engine.read().await.tip().cloned().unwrap();
    assert_eq!(tip.height, 2);
    assert_eq!(tip, h.queries.tip().await.unwrap());
}

#[tokio::test]
async fn test_reorg_reincludes_returned_transactions() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(10))]);
    let txid = h
        .submit("alice", Some("bob"), send(PROPERTY_MAIN_TOKEN, coins(4)))
        .await;
    h.mine().await;

    // the transaction returns to the pool and confirms again
    h.chain.invalidate_tip().await.unwrap();
    assert_eq!(h.chain.pool_size().await, 1);
    h.chain.mine_block_with_time(GENESIS_TIME + 900).await;
    let outcome = h.sync().await;

    assert_eq!(outcome.rolled_back, 1);
    assert_eq!(outcome.applied, 1);
    let record = h.record(&txid).await;
    assert!(record.valid);
    assert_eq!(record.block_time, GENESIS_TIME + 900);
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, coins(4));
}

#[tokio::test]
async fn test_reorg_undoes_issuance_and_crowdsale() {
    let mut h = Harness::new(&[("buyer", PROPERTY_MAIN_TOKEN, coins(1))]);
    h.mine().await;

    h.submit(
        "issuer",
        None,
        Payload::CreatePropertyVariable {
            ecosystem: 1,
            property_type: 1,
            previous_property: 0,
            metadata: metadata("Short Lived"),
            desired_property: PROPERTY_MAIN_TOKEN,
            tokens_per_unit: 100,
            deadline: (GENESIS_TIME + 1_000_000) as u64,
            early_bonus: 0,
            issuer_percent: 0,
        },
    )
    .await;
    h.mine().await;
    h.submit("buyer", Some("issuer"), send(PROPERTY_MAIN_TOKEN, coins(1)))
        .await;
    h.mine().await;
    assert_eq!(h.balance("buyer", 3).await.available, 100);

    h.chain.reorg_to(1).await.unwrap();
    h.chain.clear_pool().await;
    let replacement = h
        .submit("other", None, fixed_issuance(1, false, "Replacement", 5))
        .await;
    h.chain.mine_blocks(3).await;
    let outcome = h.sync().await;
    assert_eq!(outcome.rolled_back, 2);
    assert_eq!(outcome.applied, 3);

    // id 3 is free again and goes to the replacement issuance
    assert!(h.queries.crowdsale_info(3).await.is_none());
    assert_eq!(h.queries.property_info(3).await.unwrap().issuer, "other");
    assert_eq!(
        h.record(&replacement).await.details.created_property,
        Some(3)
    );
    assert!(h.queries.active_crowdsales().await.is_empty());
    assert_eq!(h.balance("buyer", PROPERTY_MAIN_TOKEN).await.available, coins(1));
    assert_eq!(h.balance("buyer", 3).await.available, 0);
    assert_eq!(h.balance("issuer", PROPERTY_MAIN_TOKEN).await.available, 0);
    assert!(h.engine.read().await.verify_supply().is_ok());
}

#[tokio::test]
async fn test_source_falling_behind_rolls_back() {
    let mut h = Harness::new(&[("alice", PROPERTY_MAIN_TOKEN, coins(10))]);
    h.mine().await;
    h.submit("alice", Some("bob"), send(PROPERTY_MAIN_TOKEN, coins(1)))
        .await;
    h.mine().await;
    h.mine().await;

    // shorter chain: the engine must drop blocks 2 and 3
    h.chain.reorg_to(1).await.unwrap();
    h.chain.clear_pool().await;
    let outcome = h.sync().await;

    assert_eq!(outcome.rolled_back, 2);
    assert_eq!(outcome.applied, 0);
    assert_eq!(h.engine.read().await.tip().unwrap().height, 1);
    assert_eq!(h.balance("bob", PROPERTY_MAIN_TOKEN).await.available, 0);
}

#[tokio::test]
async fn test_fork_deeper_than_history_is_fatal() {
    let config = EngineConfig {
        genesis_allocations: vec![GenesisAllocation {
            address: "alice".to_string(),
            property: PROPERTY_MAIN_TOKEN,
            amount: 10,
        }],
        max_reorg_depth: 2,
        ..EngineConfig::default()
    };
    let mut h = Harness::with_config(ConsensusParams::for_network(Network::Regtest), config);
    h.mine_until(5).await;

    h.chain.reorg_to(1).await.unwrap();
    h.chain.mine_block_with_time(GENESIS_TIME + 1).await;
    h.chain.mine_blocks(5).await;

    let result = h.follower.sync_once().await;
    assert!(matches!(
        result,
        Err(BlockProcessorError::EngineError(
            EngineError::ReorgInconsistency(_)
        ))
    ));
    assert_eq!(h.engine.read().await.tip().unwrap().height, 5);
}
