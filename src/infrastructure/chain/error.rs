use std::error::Error;
use std::fmt;

/// Errors raised while reading blocks from the host chain
#[derive(Debug)]
pub enum ChainSourceError {
    /// Error from the Bitcoin Core RPC client
    RpcError(bitcoincore_rpc::Error),
    /// Connection error
    ConnectionError(String),
    /// Requested block is not part of the chain
    BlockNotFound(u32),
    /// Node returned data that could not be interpreted
    ParseError(String),
    /// Operation not offered by this source
    Unsupported(String),
    /// Other error
    Other(String),
}

impl Clone for ChainSourceError {
    fn clone(&self) -> Self {
        match self {
            ChainSourceError::RpcError(e) => ChainSourceError::Other(e.to_string()),
            ChainSourceError::ConnectionError(msg) => {
                ChainSourceError::ConnectionError(msg.clone())
            }
            ChainSourceError::BlockNotFound(height) => ChainSourceError::BlockNotFound(*height),
            ChainSourceError::ParseError(msg) => ChainSourceError::ParseError(msg.clone()),
            ChainSourceError::Unsupported(msg) => ChainSourceError::Unsupported(msg.clone()),
            ChainSourceError::Other(msg) => ChainSourceError::Other(msg.clone()),
        }
    }
}

impl fmt::Display for ChainSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainSourceError::RpcError(e) => write!(f, "Bitcoin RPC error: {}", e),
            ChainSourceError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            ChainSourceError::BlockNotFound(height) => write!(f, "Block {} not found", height),
            ChainSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ChainSourceError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            ChainSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Error for ChainSourceError {}

impl From<bitcoincore_rpc::Error> for ChainSourceError {
    fn from(error: bitcoincore_rpc::Error) -> Self {
        ChainSourceError::RpcError(error)
    }
}
