use std::error::Error;
use std::fmt;

/// Error type for state store operations
#[derive(Debug)]
pub enum StoreError {
    /// Error reading or writing the snapshot file
    IoError(std::io::Error),
    /// Snapshot could not be encoded or decoded
    SerializationError(serde_json::Error),
    /// Snapshot was written for another network or format
    IncompatibleSnapshot(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "I/O error: {}", e),
            StoreError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            StoreError::IncompatibleSnapshot(msg) => write!(f, "Incompatible snapshot: {}", msg),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::IoError(e) => Some(e),
            StoreError::SerializationError(e) => Some(e),
            StoreError::IncompatibleSnapshot(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err)
    }
}
