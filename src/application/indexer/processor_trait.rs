use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::errors::BlockProcessorError;

/// What one synchronization round did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Blocks disconnected by a reorganization
    pub rolled_back: u32,
    /// Blocks applied on top of the tip
    pub applied: u32,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.rolled_back > 0 || self.applied > 0
    }
}

/// Defines common interface for processors that follow a host chain
#[async_trait]
pub trait ChainProcessor: Send + Sync + Debug {
    /// Returns the network name for this processor
    fn network_name(&self) -> &str;

    /// Starts continuous block processing loop
    async fn start_processing(&mut self) -> Result<(), BlockProcessorError>;

    /// Catch up with the source once, handling a reorganization first
    async fn sync_once(&mut self) -> Result<SyncOutcome, BlockProcessorError>;
}
