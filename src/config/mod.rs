pub mod consensus;

pub use consensus::{ConsensusParams, TransactionRestriction};

use dotenv::dotenv;
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::domain::models::PropertyId;

/// Host chain network the indexer follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}

/// Where blocks come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSourceKind {
    /// In-process chain fed by the submission API
    Local,
    /// Bitcoin Core compatible RPC node
    Node,
}

/// Configuration for the host chain connection
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Block source selection
    pub source: ChainSourceKind,
    /// Network name
    pub network: Network,
    /// Node RPC host
    pub host: String,
    /// Node RPC port
    pub port: String,
    /// Node RPC username
    pub username: String,
    /// Node RPC password
    pub password: String,
    /// Marker prefix of embedded payloads
    pub payload_marker: String,
    /// Mining interval of the local chain in milliseconds
    pub local_block_interval_ms: u64,
}

/// A token balance credited before the first block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisAllocation {
    pub address: String,
    pub property: PropertyId,
    pub amount: i64,
}

/// Configuration for the consensus engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Addresses allowed to send feature activations, `any` allows everyone
    pub activation_allow_senders: Vec<String>,
    /// Addresses whose activations are always ignored
    pub activation_ignore_senders: Vec<String>,
    /// Send-to-owners fee per recipient in raw protocol token units
    pub sto_fee_per_recipient: i64,
    /// Length of one early-bonus period of a crowdsale in seconds
    pub crowdsale_bonus_period_secs: i64,
    /// Balances credited at genesis
    pub genesis_allocations: Vec<GenesisAllocation>,
    /// Number of blocks whose undo logs are retained
    pub max_reorg_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            activation_allow_senders: Vec::new(),
            activation_ignore_senders: Vec::new(),
            sto_fee_per_recipient: 1,
            crowdsale_bonus_period_secs: 604_800,
            genesis_allocations: Vec::new(),
            max_reorg_depth: 288,
        }
    }
}

impl EngineConfig {
    /// Checks whether a sender may activate or deactivate features
    pub fn is_activation_sender_allowed(&self, sender: &str) -> bool {
        if self.activation_ignore_senders.iter().any(|s| s == sender) {
            return false;
        }
        self.activation_allow_senders
            .iter()
            .any(|s| s == "any" || s == sender)
    }
}

/// Configuration for the indexer loop
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Process interval in milliseconds
    pub process_interval_ms: u64,
    /// Path of the engine snapshot
    pub state_file: String,
}

/// Configuration for the HTTP API
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Listen port
    pub api_port: u16,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host chain configuration
    pub chain: ChainConfig,
    /// Engine configuration
    pub engine: EngineConfig,
    /// Consensus parameters for the selected network
    pub consensus: ConsensusParams,
    /// Indexer configuration
    pub indexer: IndexerConfig,
    /// HTTP API configuration
    pub web: WebConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        // Ensure .env file is loaded
        dotenv().ok();

        let network = env::var("CHAIN_NETWORK")
            .unwrap_or_else(|_| "regtest".to_string())
            .parse::<Network>()
            .unwrap_or(Network::Regtest);

        let source = match env::var("CHAIN_SOURCE")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "node" => ChainSourceKind::Node,
            _ => ChainSourceKind::Local,
        };

        let chain_config = ChainConfig {
            source,
            network,
            host: env::var("BITCOIN_RPC_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("BITCOIN_RPC_PORT").unwrap_or_else(|_| "18443".to_string()),
            username: env::var("BITCOIN_RPC_USER").unwrap_or_else(|_| "hello".to_string()),
            password: env::var("BITCOIN_RPC_PASSWORD").unwrap_or_else(|_| "world".to_string()),
            payload_marker: env::var("PAYLOAD_MARKER").unwrap_or_else(|_| "omni".to_string()),
            local_block_interval_ms: env::var("LOCAL_BLOCK_INTERVAL_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse::<u64>()
                .unwrap_or(10000),
        };

        let engine_config = EngineConfig {
            activation_allow_senders: split_list(
                &env::var("ACTIVATION_ALLOW_SENDERS").unwrap_or_default(),
            ),
            activation_ignore_senders: split_list(
                &env::var("ACTIVATION_IGNORE_SENDERS").unwrap_or_default(),
            ),
            sto_fee_per_recipient: env::var("STO_FEE_PER_RECIPIENT")
                .unwrap_or_else(|_| "1".to_string())
                .parse::<i64>()
                .unwrap_or(1),
            crowdsale_bonus_period_secs: env::var("CROWDSALE_BONUS_PERIOD_SECS")
                .unwrap_or_else(|_| "604800".to_string())
                .parse::<i64>()
                .unwrap_or(604_800),
            genesis_allocations: parse_allocations(
                &env::var("GENESIS_ALLOCATIONS").unwrap_or_default(),
            ),
            max_reorg_depth: env::var("MAX_REORG_DEPTH")
                .unwrap_or_else(|_| "288".to_string())
                .parse::<u32>()
                .unwrap_or(288),
        };

        let mut consensus = ConsensusParams::for_network(network);
        consensus.genesis_block = env::var("GENESIS_BLOCK_HEIGHT")
            .unwrap_or_else(|_| consensus.genesis_block.to_string())
            .parse::<u32>()
            .unwrap_or(consensus.genesis_block);
        consensus.min_activation_blocks = env::var("ACTIVATION_MIN_BLOCKS")
            .unwrap_or_else(|_| consensus.min_activation_blocks.to_string())
            .parse::<u32>()
            .unwrap_or(consensus.min_activation_blocks);
        consensus.max_activation_blocks = env::var("ACTIVATION_MAX_BLOCKS")
            .unwrap_or_else(|_| consensus.max_activation_blocks.to_string())
            .parse::<u32>()
            .unwrap_or(consensus.max_activation_blocks);

        let indexer_config = IndexerConfig {
            process_interval_ms: env::var("PROCESS_BLOCK_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse::<u64>()
                .unwrap_or(1000),
            state_file: env::var("STATE_FILE")
                .unwrap_or_else(|_| "./metalayer-state.json".to_string()),
        };

        let web_config = WebConfig {
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .unwrap_or(3001),
        };

        Self {
            chain: chain_config,
            engine: engine_config,
            consensus,
            indexer: indexer_config,
            web: web_config,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Parses `address:property:amount` triples separated by commas.
/// Malformed entries are skipped.
fn parse_allocations(raw: &str) -> Vec<GenesisAllocation> {
    split_list(raw)
        .into_iter()
        .filter_map(|entry| {
            let mut parts = entry.split(':');
            let address = parts.next()?.to_string();
            let property = parts.next()?.parse::<PropertyId>().ok()?;
            let amount = parts.next()?.parse::<i64>().ok()?;
            if address.is_empty() || amount <= 0 {
                return None;
            }
            Some(GenesisAllocation {
                address,
                property,
                amount,
            })
        })
        .collect()
}
