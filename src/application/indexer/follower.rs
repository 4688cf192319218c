//! Chain follower
//!
//! Keeps the engine on the source's best chain: when the block under the
//! engine tip is no longer part of it, the engine is rolled back to the last
//! common block before new blocks are applied.

use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use crate::config::IndexerConfig;
use crate::domain::errors::{BlockProcessorError, EngineError};
use crate::infrastructure::persistence::StateStore;
use crate::utils::logging;

use super::processor::BlockProcessor;
use super::processor_trait::{ChainProcessor, SyncOutcome};

#[derive(Debug)]
pub struct ChainFollower {
    processor: BlockProcessor,
    store: Option<StateStore>,
    process_interval_ms: u64,
}

impl ChainFollower {
    pub fn new(processor: BlockProcessor, config: &IndexerConfig) -> Self {
        Self {
            processor,
            store: None,
            process_interval_ms: config.process_interval_ms,
        }
    }

    /// Save a snapshot after every round that changed the engine
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn processor(&self) -> &BlockProcessor {
        &self.processor
    }

    /// Roll back to the last block shared with the source.
    /// Returns the number of disconnected blocks.
    async fn reconcile(&self, source_height: u32) -> Result<u32, BlockProcessorError> {
        let Some(tip) = self.processor.engine().read().await.tip().cloned() else {
            return Ok(0);
        };

        let mut height = tip.height.min(source_height);
        let ancestor = loop {
            let local = self
                .processor
                .engine()
                .read()
                .await
                .block_hash_at(height)
                .map(|h| h.to_string());
            let Some(local) = local else {
                return Err(EngineError::ReorgInconsistency(format!(
                    "fork below block {} is deeper than the retained undo history",
                    height
                ))
                .into());
            };
            if self.processor.source_hash(height).await? == local {
                break height;
            }
            let genesis = self.processor.engine().read().await.params().genesis_block;
            if height <= genesis {
                return Err(EngineError::ReorgInconsistency(format!(
                    "genesis block {} is not part of the source chain",
                    height
                ))
                .into());
            }
            height -= 1;
        };

        if ancestor == tip.height {
            return Ok(0);
        }

        logging::log_warning(&format!(
            "[{}] 🔀 Reorganization detected: tip {} ({}) left the chain, common block {}",
            self.processor.network(),
            tip.height,
            tip.hash,
            ancestor
        ));
        let disconnected = self.processor.engine().write().await.rollback_to(ancestor)?;
        logging::log_info(&format!(
            "[{}] {} transactions marked as reorganized",
            self.processor.network(),
            disconnected.len()
        ));
        Ok(tip.height - ancestor)
    }

    async fn persist(&self) -> Result<(), BlockProcessorError> {
        if let Some(store) = &self.store {
            let snapshot = self.processor.engine().read().await.snapshot();
            store.save(snapshot).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChainProcessor for ChainFollower {
    fn network_name(&self) -> &str {
        self.processor.network()
    }

    async fn start_processing(&mut self) -> Result<(), BlockProcessorError> {
        logging::log_info(&format!(
            "[{}] 🚀 Following {}",
            self.network_name(),
            self.processor.source().source_name()
        ));

        loop {
            match self.sync_once().await {
                Ok(_) => {}
                Err(BlockProcessorError::EngineError(EngineError::ReorgInconsistency(msg))) => {
                    logging::log_error(&format!(
                        "[{}] Stopping, state can no longer follow the chain: {}",
                        self.network_name(),
                        msg
                    ));
                    return Err(EngineError::ReorgInconsistency(msg).into());
                }
                Err(e) => {
                    logging::log_error(&format!(
                        "[{}] Sync round failed: {}",
                        self.network_name(),
                        e
                    ));
                }
            }
            sleep(Duration::from_millis(self.process_interval_ms)).await;
        }
    }

    async fn sync_once(&mut self) -> Result<SyncOutcome, BlockProcessorError> {
        // STEP 1: Where is the source
        let source_height = self.processor.source_height().await?;

        // STEP 2: Leave any branch the source abandoned
        let mut outcome = SyncOutcome {
            rolled_back: self.reconcile(source_height).await?,
            applied: 0,
        };

        // STEP 3: Apply what is missing
        let mut next = self.processor.engine().read().await.next_height();
        while next <= source_height {
            match self.processor.process_block(next).await {
                Ok(_) => outcome.applied += 1,
                Err(BlockProcessorError::EngineError(EngineError::ParentMismatch {
                    height, ..
                })) => {
                    // the source moved under us; the next round reconciles
                    logging::log_warning(&format!(
                        "[{}] Block {} does not extend the tip, retrying next round",
                        self.network_name(),
                        height
                    ));
                    break;
                }
                Err(e) => {
                    if outcome.changed() {
                        self.persist().await?;
                    }
                    return Err(e);
                }
            }
            next += 1;
        }

        // STEP 4: Persist
        if outcome.changed() {
            self.persist().await?;
        }
        Ok(outcome)
    }
}
