//! JSON snapshot store for the engine
//!
//! The snapshot is written to a sibling temp file and renamed over the
//! previous one, so a crash never leaves a half written state behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::StoreError;
use crate::application::engine::EngineSnapshot;

const SNAPSHOT_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredSnapshot {
    format: u32,
    network: String,
    saved_at: DateTime<Utc>,
    snapshot: EngineSnapshot,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    network: String,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>, network: &str) -> Self {
        Self {
            path: path.into(),
            network: network.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last saved snapshot, `None` if nothing was saved yet
    pub async fn load(&self) -> Result<Option<EngineSnapshot>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSnapshot = serde_json::from_slice(&bytes)?;
        if stored.format != SNAPSHOT_FORMAT {
            return Err(StoreError::IncompatibleSnapshot(format!(
                "format {} is not supported",
                stored.format
            )));
        }
        if stored.network != self.network {
            return Err(StoreError::IncompatibleSnapshot(format!(
                "snapshot belongs to {}, not {}",
                stored.network, self.network
            )));
        }
        Ok(Some(stored.snapshot))
    }

    /// Atomically replace the saved snapshot
    pub async fn save(&self, snapshot: EngineSnapshot) -> Result<(), StoreError> {
        let stored = StoredSnapshot {
            format: SNAPSHOT_FORMAT,
            network: self.network.clone(),
            saved_at: Utc::now(),
            snapshot,
        };
        let bytes = serde_json::to_vec(&stored)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::ConsensusEngine;
    use crate::config::{ConsensusParams, EngineConfig, GenesisAllocation, Network};

    fn engine() -> ConsensusEngine {
        let config = EngineConfig {
            genesis_allocations: vec![GenesisAllocation {
                address: "alice".to_string(),
                property: 1,
                amount: 42,
            }],
            ..EngineConfig::default()
        };
        ConsensusEngine::new(ConsensusParams::for_network(Network::Regtest), config)
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"), "regtest");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"), "regtest");
        let snapshot = engine().snapshot();
        store.save(snapshot.clone()).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_other_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        StateStore::new(&path, "regtest")
            .save(engine().snapshot())
            .await
            .unwrap();

        let result = StateStore::new(&path, "mainnet").load().await;
        assert!(matches!(result, Err(StoreError::IncompatibleSnapshot(_))));
    }
}
