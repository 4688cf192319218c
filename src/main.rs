use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

use metalayer_indexer::application::engine::{ConsensusEngine, EngineQueries};
use metalayer_indexer::application::indexer::{BlockProcessor, ChainFollower, ChainProcessor};
use metalayer_indexer::config::{AppConfig, ChainSourceKind};
use metalayer_indexer::infrastructure::chain::{BlockSource, LocalChain, NodeBlockSource};
use metalayer_indexer::infrastructure::persistence::StateStore;
use metalayer_indexer::infrastructure::web::{start_server, AppState};
use metalayer_indexer::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logger();

    let config = AppConfig::from_env();
    let network = config.chain.network.name();
    logging::log_info(&format!(
        "Metalayer indexer v{} on {}",
        env!("CARGO_PKG_VERSION"),
        network
    ));

    // Block source
    let (source, local_chain): (Arc<dyn BlockSource>, Option<Arc<LocalChain>>) =
        match config.chain.source {
            ChainSourceKind::Node => {
                logging::log_node_connection_details(
                    &config.chain.host,
                    &config.chain.port,
                    &config.chain.username,
                    network,
                );
                (Arc::new(NodeBlockSource::new(&config.chain)?), None)
            }
            ChainSourceKind::Local => {
                let chain = Arc::new(LocalChain::new(chrono::Utc::now().timestamp()));
                spawn_local_miner(chain.clone(), config.chain.local_block_interval_ms);
                (chain.clone(), Some(chain))
            }
        };

    // Engine, resumed from the snapshot when following a node.
    // The local chain lives in memory, so its state always starts fresh.
    let store = StateStore::new(&config.indexer.state_file, network);
    let engine = match (&config.chain.source, store.load().await) {
        (ChainSourceKind::Node, Ok(Some(snapshot))) => {
            logging::log_state_store_details(&config.indexer.state_file);
            ConsensusEngine::from_snapshot(
                config.consensus.clone(),
                config.engine.clone(),
                snapshot,
            )
        }
        (ChainSourceKind::Node, Err(e)) => {
            return Err(anyhow::anyhow!(
                "Failed to load state from {}: {}",
                config.indexer.state_file,
                e
            ));
        }
        _ => ConsensusEngine::new(config.consensus.clone(), config.engine.clone()),
    };
    let engine = Arc::new(RwLock::new(engine));

    // Follower
    let processor = BlockProcessor::new(source.clone(), engine.clone(), network);
    let mut follower = ChainFollower::new(processor, &config.indexer);
    if config.chain.source == ChainSourceKind::Node {
        follower = follower.with_store(store);
    }
    let follower_handle = tokio::spawn(async move { follower.start_processing().await });

    // Query API
    let state = AppState {
        queries: EngineQueries::new(engine),
        local_chain,
        source_name: source.source_name(),
        network: network.to_string(),
    };
    let web_config = config.web.clone();
    let server_handle = tokio::spawn(async move { start_server(&web_config, state).await });

    tokio::select! {
        result = follower_handle => {
            result??;
        }
        result = server_handle => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            logging::log_info("Shutting down");
        }
    }
    Ok(())
}

/// Mine the local pool on a fixed interval, stamping blocks with wall clock time
fn spawn_local_miner(chain: Arc<LocalChain>, interval_ms: u64) {
    tokio::spawn(async move {
        loop {
            sleep(Duration::from_millis(interval_ms.max(1))).await;
            let tip_time = chain.tip().await.time;
            let time = chrono::Utc::now().timestamp().max(tip_time + 1);
            let block = chain.mine_block_with_time(time).await;
            logging::log_debug(&format!(
                "⛏️ Mined local block {} with {} transactions",
                block.height,
                block.transactions.len()
            ));
        }
    });
}
