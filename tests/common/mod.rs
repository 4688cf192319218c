#![allow(dead_code)]

use std::sync::Arc;
use tokio::sync::RwLock;

use metalayer_indexer::application::engine::{EngineQueries, SharedEngine};
use metalayer_indexer::application::indexer::{
    BlockProcessor, ChainFollower, ChainProcessor, RetryHandler, SyncOutcome,
};
use metalayer_indexer::application::engine::ConsensusEngine;
use metalayer_indexer::config::{
    ConsensusParams, EngineConfig, GenesisAllocation, IndexerConfig, Network,
};
use metalayer_indexer::domain::models::{
    Balance, ChainBlock, PropertyId, PropertyMetadata, TransactionRecord, COIN,
};
use metalayer_indexer::domain::services::payload::{encode_hex, Payload};
use metalayer_indexer::infrastructure::chain::LocalChain;

pub const GENESIS_TIME: i64 = 1_700_000_000;
pub const ADMIN: &str = "admin";

/// Local chain, engine and follower wired together the way the binary does
pub struct Harness {
    pub chain: Arc<LocalChain>,
    pub engine: SharedEngine,
    pub queries: EngineQueries,
    pub follower: ChainFollower,
}

impl Harness {
    /// Regtest harness crediting `(address, property, raw amount)` at genesis
    pub fn new(allocations: &[(&str, PropertyId, i64)]) -> Self {
        let config = EngineConfig {
            genesis_allocations: allocations
                .iter()
                .map(|(address, property, amount)| GenesisAllocation {
                    address: address.to_string(),
                    property: *property,
                    amount: *amount,
                })
                .collect(),
            activation_allow_senders: vec![ADMIN.to_string()],
            ..EngineConfig::default()
        };
        Self::with_config(ConsensusParams::for_network(Network::Regtest), config)
    }

    pub fn with_config(params: ConsensusParams, config: EngineConfig) -> Self {
        let chain = Arc::new(LocalChain::new(GENESIS_TIME));
        let engine = Arc::new(RwLock::new(ConsensusEngine::new(params, config)));
        let processor = BlockProcessor::new(chain.clone(), engine.clone(), "regtest")
            .with_retry_handler(RetryHandler::with_config(1, 1));
        let follower = ChainFollower::new(
            processor,
            &IndexerConfig {
                process_interval_ms: 10,
                state_file: String::new(),
            },
        );
        Self {
            chain,
            queries: EngineQueries::new(engine.clone()),
            engine,
            follower,
        }
    }

    pub async fn submit(&self, sender: &str, reference: Option<&str>, payload: Payload) -> String {
        self.chain
            .submit_raw(sender, &encode_hex(payload), reference)
            .await
            .unwrap()
    }

    /// Catch up with the chain; every synced state must keep each property's
    /// recorded supply equal to the sum of its balances
    pub async fn sync(&mut self) -> SyncOutcome {
        let outcome = self.follower.sync_once().await.unwrap();
        self.engine.read().await.verify_supply().unwrap();
        outcome
    }

    /// Mine the pool and let the engine catch up
    pub async fn mine(&mut self) -> ChainBlock {
        let block = self.chain.mine_block().await;
        self.sync().await;
        block
    }

    pub async fn mine_with_time(&mut self, time: i64) -> ChainBlock {
        let block = self.chain.mine_block_with_time(time).await;
        self.sync().await;
        block
    }

    pub async fn mine_until(&mut self, height: u32) {
        while self.chain.tip().await.height < height {
            self.chain.mine_block().await;
        }
        self.sync().await;
    }

    pub async fn balance(&self, address: &str, property: PropertyId) -> Balance {
        self.queries.balance_of(address, property).await
    }

    pub async fn record(&self, txid: &str) -> TransactionRecord {
        self.queries.transaction_info(txid).await.unwrap()
    }
}

pub fn metadata(name: &str) -> PropertyMetadata {
    PropertyMetadata {
        category: "Test".to_string(),
        subcategory: "Integration".to_string(),
        name: name.to_string(),
        url: "https://example.com".to_string(),
        data: String::new(),
    }
}

/// Raw units of `whole` divisible tokens
pub fn coins(whole: i64) -> i64 {
    whole * COIN
}

pub fn send(property: PropertyId, amount: i64) -> Payload {
    Payload::SimpleSend {
        property,
        amount: amount as u64,
    }
}

pub fn fixed_issuance(ecosystem: u8, divisible: bool, name: &str, amount: i64) -> Payload {
    Payload::CreatePropertyFixed {
        ecosystem,
        property_type: if divisible { 2 } else { 1 },
        previous_property: 0,
        metadata: metadata(name),
        amount: amount as u64,
    }
}

pub fn managed_issuance(ecosystem: u8, divisible: bool, name: &str) -> Payload {
    Payload::CreatePropertyManual {
        ecosystem,
        property_type: if divisible { 2 } else { 1 },
        previous_property: 0,
        metadata: metadata(name),
    }
}

pub fn activation(feature_id: u16, activation_block: u32) -> Payload {
    Payload::Activation {
        feature_id,
        activation_block,
        min_client_version: 0,
    }
}
