//! In-process chain for regtest and tests
//!
//! Submitted transactions wait in a pool until a block is mined. Blocks can be
//! invalidated to simulate reorganizations; their transactions return to the
//! pool like they would on a real node.

use async_trait::async_trait;
use bitcoin::hashes::{sha256d, Hash};
use tokio::sync::Mutex;

use super::{BlockSource, ChainSourceError};
use crate::domain::models::{ChainBlock, ChainTx};

/// Seconds between blocks mined without an explicit time
pub const LOCAL_BLOCK_SPACING_SECS: i64 = 600;

const NULL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug)]
struct LocalChainState {
    blocks: Vec<ChainBlock>,
    pool: Vec<ChainTx>,
    /// Distinguishes otherwise identical submissions and blocks
    sequence: u64,
}

#[derive(Debug)]
pub struct LocalChain {
    inner: Mutex<LocalChainState>,
}

impl LocalChain {
    /// Chain holding only a genesis block at height 0
    pub fn new(genesis_time: i64) -> Self {
        let genesis = ChainBlock {
            height: 0,
            hash: double_sha256(format!("genesis|{}", genesis_time).as_bytes()),
            parent_hash: NULL_HASH.to_string(),
            time: genesis_time,
            transactions: Vec::new(),
        };
        Self {
            inner: Mutex::new(LocalChainState {
                blocks: vec![genesis],
                pool: Vec::new(),
                sequence: 0,
            }),
        }
    }

    /// Queue a transaction for the next block and return its txid
    pub async fn submit_raw(
        &self,
        sender: &str,
        payload_hex: &str,
        reference: Option<&str>,
    ) -> Result<String, ChainSourceError> {
        if sender.is_empty() {
            return Err(ChainSourceError::ParseError("sender is empty".to_string()));
        }
        let payload = hex::decode(payload_hex.trim())
            .map_err(|e| ChainSourceError::ParseError(format!("payload is not hex: {}", e)))?;

        let mut state = self.inner.lock().await;
        state.sequence += 1;
        let serialized = format!(
            "{}|{}|{}|{}",
            sender,
            payload_hex.trim().to_lowercase(),
            reference.unwrap_or(""),
            state.sequence
        );
        let txid = double_sha256(serialized.as_bytes());
        state.pool.push(ChainTx {
            txid: txid.clone(),
            sender: sender.to_string(),
            reference: reference.map(|r| r.to_string()),
            payload,
        });
        Ok(txid)
    }

    /// Queue an already built transaction, e.g. one taken from a disconnected block
    pub async fn submit_tx(&self, tx: ChainTx) {
        self.inner.lock().await.pool.push(tx);
    }

    pub async fn pool_size(&self) -> usize {
        self.inner.lock().await.pool.len()
    }

    /// Drop every pending transaction
    pub async fn clear_pool(&self) -> Vec<ChainTx> {
        std::mem::take(&mut self.inner.lock().await.pool)
    }

    /// Mine the pool into a block spaced after the current tip
    pub async fn mine_block(&self) -> ChainBlock {
        let mut state = self.inner.lock().await;
        let time = state.tip().time + LOCAL_BLOCK_SPACING_SECS;
        state.mine(time)
    }

    /// Mine the pool into a block with the given timestamp
    pub async fn mine_block_with_time(&self, time: i64) -> ChainBlock {
        self.inner.lock().await.mine(time)
    }

    /// Mine `count` blocks and return the new tip
    pub async fn mine_blocks(&self, count: u32) -> Option<ChainBlock> {
        let mut last = None;
        for _ in 0..count {
            last = Some(self.mine_block().await);
        }
        last
    }

    pub async fn tip(&self) -> ChainBlock {
        self.inner.lock().await.tip().clone()
    }

    /// Disconnect the tip block; its transactions return to the pool
    pub async fn invalidate_tip(&self) -> Result<ChainBlock, ChainSourceError> {
        let mut state = self.inner.lock().await;
        if state.blocks.len() <= 1 {
            return Err(ChainSourceError::Unsupported(
                "cannot invalidate the genesis block".to_string(),
            ));
        }
        let removed = state
            .blocks
            .pop()
            .ok_or(ChainSourceError::BlockNotFound(0))?;
        let mut returned = removed.transactions.clone();
        returned.append(&mut state.pool);
        state.pool = returned;
        Ok(removed)
    }

    /// Disconnect every block above `height`
    pub async fn reorg_to(&self, height: u32) -> Result<Vec<ChainBlock>, ChainSourceError> {
        let mut removed = Vec::new();
        loop {
            let tip_height = self.inner.lock().await.tip().height;
            if tip_height <= height {
                break;
            }
            removed.push(self.invalidate_tip().await?);
        }
        Ok(removed)
    }
}

impl LocalChainState {
    fn tip(&self) -> &ChainBlock {
        // genesis is never removed
        &self.blocks[self.blocks.len() - 1]
    }

    fn mine(&mut self, time: i64) -> ChainBlock {
        self.sequence += 1;
        let parent = self.tip();
        let height = parent.height + 1;
        let parent_hash = parent.hash.clone();
        let transactions = std::mem::take(&mut self.pool);

        let mut header = format!("{}|{}|{}|{}", height, parent_hash, time, self.sequence);
        for tx in &transactions {
            header.push('|');
            header.push_str(&tx.txid);
        }

        let block = ChainBlock {
            height,
            hash: double_sha256(header.as_bytes()),
            parent_hash,
            time,
            transactions,
        };
        self.blocks.push(block.clone());
        block
    }
}

fn double_sha256(data: &[u8]) -> String {
    sha256d::Hash::hash(data).to_string()
}

#[async_trait]
impl BlockSource for LocalChain {
    fn source_name(&self) -> String {
        "Local Chain".to_string()
    }

    async fn get_block_count(&self) -> Result<u32, ChainSourceError> {
        Ok(self.inner.lock().await.tip().height)
    }

    async fn get_block_hash(&self, height: u32) -> Result<String, ChainSourceError> {
        self.inner
            .lock()
            .await
            .blocks
            .get(height as usize)
            .map(|b| b.hash.clone())
            .ok_or(ChainSourceError::BlockNotFound(height))
    }

    async fn get_block(&self, height: u32) -> Result<ChainBlock, ChainSourceError> {
        self.inner
            .lock()
            .await
            .blocks
            .get(height as usize)
            .cloned()
            .ok_or(ChainSourceError::BlockNotFound(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mine_links_blocks() {
        let chain = LocalChain::new(1_000);
        let txid = chain
            .submit_raw("alice", "00000000000000010000000000000001", Some("bob"))
            .await
            .unwrap();
        assert_eq!(txid.len(), 64);

        let block = chain.mine_block().await;
        assert_eq!(block.height, 1);
        assert_eq!(block.time, 1_000 + LOCAL_BLOCK_SPACING_SECS);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].txid, txid);
        assert_eq!(block.parent_hash, chain.get_block_hash(0).await.unwrap());
        assert_eq!(chain.get_block_count().await.unwrap(), 1);
        assert_eq!(chain.pool_size().await, 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_hex() {
        let chain = LocalChain::new(0);
        assert!(matches!(
            chain.submit_raw("alice", "zz", None).await,
            Err(ChainSourceError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_identical_submissions_get_distinct_txids() {
        let chain = LocalChain::new(0);
        let a = chain.submit_raw("alice", "00", None).await.unwrap();
        let b = chain.submit_raw("alice", "00", None).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_invalidate_returns_transactions_to_pool() {
        let chain = LocalChain::new(0);
        chain.submit_raw("alice", "00", None).await.unwrap();
        let mined = chain.mine_block().await;

        let removed = chain.invalidate_tip().await.unwrap();
        assert_eq!(removed.hash, mined.hash);
        assert_eq!(chain.pool_size().await, 1);

        let replacement = chain.mine_block().await;
        assert_eq!(replacement.height, 1);
        assert_ne!(replacement.hash, mined.hash);
        assert!(chain.invalidate_tip().await.is_ok());
        assert!(chain.invalidate_tip().await.is_err());
    }

    #[tokio::test]
    async fn test_reorg_to() {
        let chain = LocalChain::new(0);
        chain.mine_blocks(5).await;
        let removed = chain.reorg_to(2).await.unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(chain.tip().await.height, 2);
        assert!(matches!(
            chain.get_block(3).await,
            Err(ChainSourceError::BlockNotFound(3))
        ));
    }
}
