//! Indexer Module
//!
//! Follows a block source and feeds its blocks to the consensus engine.

pub mod follower;
pub mod processor;
pub mod processor_trait;
pub mod retry_handler;

pub use follower::ChainFollower;
pub use processor::BlockProcessor;
pub use processor_trait::{ChainProcessor, SyncOutcome};
pub use retry_handler::RetryHandler;
