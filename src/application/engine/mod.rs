//! Consensus engine
//!
//! - `state`: the aggregate protocol state and undo replay
//! - `dispatch`: per-transaction validation and application
//! - `engine`: block application, rollback and snapshots
//! - `query`: read-locked query facade

pub mod dispatch;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod query;
pub mod state;

pub use engine::{BlockSummary, ConsensusEngine, EngineSnapshot, REORGANIZED_REASON};
pub use query::{CrowdsaleListing, CrowdsaleView, EngineQueries, EngineStatus, SharedEngine};
pub use state::EngineState;
