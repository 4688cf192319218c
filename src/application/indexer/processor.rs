//! Block processor applying single blocks from a source to the engine

use std::sync::Arc;

use crate::application::engine::{BlockSummary, SharedEngine};
use crate::domain::errors::BlockProcessorError;
use crate::domain::models::ChainBlock;
use crate::infrastructure::chain::{BlockSource, ChainSourceError};
use crate::utils::logging;

use super::retry_handler::RetryHandler;

#[derive(Debug, Clone)]
pub struct BlockProcessor {
    source: Arc<dyn BlockSource>,
    engine: SharedEngine,
    retry_handler: RetryHandler,
    network: String,
}

impl BlockProcessor {
    pub fn new(source: Arc<dyn BlockSource>, engine: SharedEngine, network: &str) -> Self {
        Self {
            source,
            engine,
            retry_handler: RetryHandler::new(),
            network: network.to_string(),
        }
    }

    pub fn with_retry_handler(mut self, retry_handler: RetryHandler) -> Self {
        self.retry_handler = retry_handler;
        self
    }

    pub fn source(&self) -> &Arc<dyn BlockSource> {
        &self.source
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Process a single block
    pub async fn process_block(&self, height: u32) -> Result<BlockSummary, BlockProcessorError> {
        // STEP 1: Fetch the block from the source
        let block = self.fetch_block(height).await?;

        // STEP 2: Apply under the write lock, queries never see half a block
        let summary = {
            let mut engine = self.engine.write().await;
            engine.apply_block(&block)?
        };

        // STEP 3: Report
        logging::log_info(&format!(
            "[{}] ✅ Block {}: {} Tx | {} Valid | {} Invalid",
            self.network, summary.height, summary.transactions, summary.valid, summary.invalid
        ));
        Ok(summary)
    }

    /// Height of the source's best block
    pub async fn source_height(&self) -> Result<u32, ChainSourceError> {
        self.retry_handler
            .execute_with_retry_and_logging(
                || self.source.get_block_count(),
                "Get block count",
                &self.network,
            )
            .await
    }

    pub async fn source_hash(&self, height: u32) -> Result<String, ChainSourceError> {
        self.retry_handler
            .execute_with_retry_and_logging(
                || self.source.get_block_hash(height),
                &format!("Get block hash {}", height),
                &self.network,
            )
            .await
    }

    async fn fetch_block(&self, height: u32) -> Result<ChainBlock, ChainSourceError> {
        self.retry_handler
            .execute_with_retry_and_logging(
                || self.source.get_block(height),
                &format!("Get block {}", height),
                &self.network,
            )
            .await
    }
}
