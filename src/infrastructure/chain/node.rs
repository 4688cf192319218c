//! Bitcoin Core node block source

use async_trait::async_trait;
use bitcoincore_rpc::bitcoin::blockdata::script::Instruction;
use bitcoincore_rpc::bitcoin::{Address, Network as BitcoinNetwork, Script, Transaction};
use bitcoincore_rpc::{Auth, Client, RpcApi};
use std::sync::Arc;

use super::{BlockSource, ChainSourceError};
use crate::config::{ChainConfig, Network};
use crate::domain::models::{ChainBlock, ChainTx};
use crate::domain::services::sender::{select_reference, sender_by_contribution, OutputCandidate};
use crate::utils::logging;

/// Block source reading a Bitcoin Core compatible node over RPC.
/// Sender resolution looks up previous outputs and needs `txindex=1`.
#[derive(Debug)]
pub struct NodeBlockSource {
    client: Arc<Client>,
    network: Network,
    marker: Vec<u8>,
}

impl NodeBlockSource {
    /// Create a new node block source
    pub fn new(config: &ChainConfig) -> Result<Self, ChainSourceError> {
        let url = format!("http://{}:{}", config.host, config.port);
        let auth = Auth::UserPass(config.username.clone(), config.password.clone());

        let client = Client::new(&url, auth)
            .map_err(|e| ChainSourceError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            network: config.network,
            marker: config.payload_marker.as_bytes().to_vec(),
        })
    }
}

#[async_trait]
impl BlockSource for NodeBlockSource {
    fn source_name(&self) -> String {
        format!("Bitcoin Node ({})", self.network)
    }

    async fn get_block_count(&self) -> Result<u32, ChainSourceError> {
        let client = self.client.clone();
        let count = tokio::task::spawn_blocking(move || client.get_block_count())
            .await
            .map_err(|e| ChainSourceError::Other(e.to_string()))??;
        u32::try_from(count).map_err(|e| ChainSourceError::ParseError(e.to_string()))
    }

    async fn get_block_hash(&self, height: u32) -> Result<String, ChainSourceError> {
        let client = self.client.clone();
        let hash = tokio::task::spawn_blocking(move || client.get_block_hash(u64::from(height)))
            .await
            .map_err(|e| ChainSourceError::Other(e.to_string()))??;
        Ok(hash.to_string())
    }

    async fn get_block(&self, height: u32) -> Result<ChainBlock, ChainSourceError> {
        let client = self.client.clone();
        let network = bitcoin_network(self.network);
        let marker = self.marker.clone();
        tokio::task::spawn_blocking(move || load_block(&client, height, network, &marker))
            .await
            .map_err(|e| ChainSourceError::Other(e.to_string()))?
    }
}

fn bitcoin_network(network: Network) -> BitcoinNetwork {
    match network {
        Network::Mainnet => BitcoinNetwork::Bitcoin,
        Network::Testnet => BitcoinNetwork::Testnet,
        Network::Regtest => BitcoinNetwork::Regtest,
    }
}

fn load_block(
    client: &Client,
    height: u32,
    network: BitcoinNetwork,
    marker: &[u8],
) -> Result<ChainBlock, ChainSourceError> {
    let hash = client.get_block_hash(u64::from(height))?;
    let block = client.get_block(&hash)?;

    let mut transactions = Vec::new();
    for tx in block.txdata.iter().filter(|tx| !tx.is_coin_base()) {
        let Some(payload) = marker_payload(tx, marker) else {
            continue;
        };
        match resolve_parties(client, tx, network, marker) {
            Ok(Some((sender, reference))) => transactions.push(ChainTx {
                txid: tx.txid().to_string(),
                sender,
                reference,
                payload,
            }),
            Ok(None) => logging::log_debug(&format!(
                "Skipping {}: no sender address could be resolved",
                tx.txid()
            )),
            Err(e) => return Err(e),
        }
    }

    Ok(ChainBlock {
        height,
        hash: hash.to_string(),
        parent_hash: block.header.prev_blockhash.to_string(),
        time: i64::from(block.header.time),
        transactions,
    })
}

/// Data of the first OP_RETURN output that starts with the marker
fn marker_payload(tx: &Transaction, marker: &[u8]) -> Option<Vec<u8>> {
    tx.output
        .iter()
        .filter_map(|out| op_return_data(&out.script_pubkey))
        .find(|data| data.starts_with(marker))
        .map(|data| data[marker.len()..].to_vec())
}

fn op_return_data(script: &Script) -> Option<Vec<u8>> {
    if !script.is_op_return() {
        return None;
    }
    let mut data = Vec::new();
    for instruction in script.instructions().skip(1) {
        match instruction {
            Ok(Instruction::PushBytes(bytes)) => data.extend_from_slice(bytes.as_bytes()),
            _ => return None,
        }
    }
    Some(data)
}

fn resolve_parties(
    client: &Client,
    tx: &Transaction,
    network: BitcoinNetwork,
    marker: &[u8],
) -> Result<Option<(String, Option<String>)>, ChainSourceError> {
    let mut inputs = Vec::with_capacity(tx.input.len());
    for input in &tx.input {
        let previous = client.get_raw_transaction(&input.previous_output.txid, None)?;
        let output = previous
            .output
            .get(input.previous_output.vout as usize)
            .ok_or_else(|| {
                ChainSourceError::ParseError(format!(
                    "missing output {}",
                    input.previous_output
                ))
            })?;
        if let Ok(address) = Address::from_script(&output.script_pubkey, network) {
            inputs.push((address.to_string(), output.value));
        }
    }

    let Some(sender) = sender_by_contribution(&inputs) else {
        return Ok(None);
    };

    let outputs: Vec<OutputCandidate> = tx
        .output
        .iter()
        .map(|out| OutputCandidate {
            address: Address::from_script(&out.script_pubkey, network)
                .ok()
                .map(|a| a.to_string()),
            is_marker: op_return_data(&out.script_pubkey)
                .map(|data| data.starts_with(marker))
                .unwrap_or(false),
        })
        .collect();
    let reference = select_reference(&outputs, &sender);
    Ok(Some((sender, reference)))
}
