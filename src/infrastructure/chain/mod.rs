//! Host chain block sources
//!
//! This module contains the sources the indexer can follow: a Bitcoin Core
//! compatible node and an in-process chain used for regtest and tests.

pub mod error;
pub mod local;
pub mod node;

pub use error::ChainSourceError;
pub use local::LocalChain;
pub use node::NodeBlockSource;

use async_trait::async_trait;

use crate::domain::models::ChainBlock;

/// Trait for host chain block sources
#[async_trait]
pub trait BlockSource: Send + Sync + std::fmt::Debug {
    /// Get the source name for identification
    fn source_name(&self) -> String;

    /// Get the height of the best block
    async fn get_block_count(&self) -> Result<u32, ChainSourceError>;

    /// Get block hash by height
    async fn get_block_hash(&self, height: u32) -> Result<String, ChainSourceError>;

    /// Get a block with its metadata transactions
    async fn get_block(&self, height: u32) -> Result<ChainBlock, ChainSourceError>;
}
