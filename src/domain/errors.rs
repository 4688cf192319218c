use std::error::Error;
use std::fmt;

use crate::domain::models::PropertyId;
use crate::domain::services::payload::PayloadError;
use crate::infrastructure::chain::ChainSourceError;
use crate::infrastructure::persistence::error::StoreError;

/// Reason a transaction is invalid.
///
/// These never abort block processing: the engine records them on the
/// transaction and leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    MalformedPayload(String),
    UnknownType { tx_type: u16, version: u16 },
    TypeNotPermitted { tx_type: u16, version: u16 },
    InvalidAmount,
    InsufficientBalance,
    InsufficientFee,
    UnknownProperty(PropertyId),
    PropertyNotTradeable(PropertyId),
    InvalidEcosystem,
    CrossEcosystem,
    InvalidPropertyType,
    UnsupportedPreviousProperty,
    EmptyName,
    MissingReference,
    NotIssuer,
    NotManaged,
    NotCrowdsale,
    CrowdsaleNotActive,
    ActiveCrowdsaleExists,
    DeadlineInPast,
    SupplyOverflow,
    DuplicateActiveOffer,
    NoActiveOffer,
    OfferAmountExceeded,
    SelfAccept,
    NothingToSend,
    NoRecipients,
    GracePeriodViolation { offset: i64, min: u32, max: u32 },
    UnknownFeature(u16),
    FeatureNotActivated(u16),
    FeatureNotActive(u16),
    UnauthorizedSender,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
            ProtocolError::UnknownType { tx_type, version } => {
                write!(f, "Unknown transaction type {} version {}", tx_type, version)
            }
            ProtocolError::TypeNotPermitted { .. } => {
                write!(f, "Transaction type or version not permitted")
            }
            ProtocolError::InvalidAmount => write!(f, "Value out of range or zero"),
            ProtocolError::InsufficientBalance => write!(f, "Sender has insufficient balance"),
            ProtocolError::InsufficientFee => {
                write!(f, "Sender has insufficient balance to pay the fee")
            }
            ProtocolError::UnknownProperty(id) => write!(f, "Property {} does not exist", id),
            ProtocolError::PropertyNotTradeable(id) => {
                write!(f, "Property {} is not tradeable on the distributed exchange", id)
            }
            ProtocolError::InvalidEcosystem => write!(f, "Invalid ecosystem"),
            ProtocolError::CrossEcosystem => {
                write!(f, "Properties belong to different ecosystems")
            }
            ProtocolError::InvalidPropertyType => write!(f, "Invalid property type"),
            ProtocolError::UnsupportedPreviousProperty => {
                write!(f, "Property appends or replaces are not supported")
            }
            ProtocolError::EmptyName => write!(f, "Property name is empty"),
            ProtocolError::MissingReference => write!(f, "Transaction has no reference address"),
            ProtocolError::NotIssuer => write!(f, "Sender is not the issuer of the property"),
            ProtocolError::NotManaged => write!(f, "Property is not a managed property"),
            ProtocolError::NotCrowdsale => write!(f, "Property is not a crowdsale"),
            ProtocolError::CrowdsaleNotActive => write!(f, "Crowdsale is not active"),
            ProtocolError::ActiveCrowdsaleExists => {
                write!(f, "Sender has an active crowdsale")
            }
            ProtocolError::DeadlineInPast => write!(f, "Crowdsale deadline is in the past"),
            ProtocolError::SupplyOverflow => {
                write!(f, "Amount would exceed the maximum number of tokens")
            }
            ProtocolError::DuplicateActiveOffer => write!(f, "Sender has an active offer"),
            ProtocolError::NoActiveOffer => write!(f, "No active offer exists"),
            ProtocolError::OfferAmountExceeded => {
                write!(f, "Amount exceeds the amount offered")
            }
            ProtocolError::SelfAccept => write!(f, "Buyer and seller are the same address"),
            ProtocolError::NothingToSend => write!(f, "Sender has no tokens to send"),
            ProtocolError::NoRecipients => write!(f, "No owners to distribute to"),
            ProtocolError::GracePeriodViolation { offset, min, max } => write!(
                f,
                "Activation block is {} blocks ahead, outside the grace period [{}, {}]",
                offset, min, max
            ),
            ProtocolError::UnknownFeature(id) => write!(f, "Unknown feature {}", id),
            ProtocolError::FeatureNotActivated(id) => {
                write!(f, "Feature {} is not activated", id)
            }
            ProtocolError::FeatureNotActive(id) => write!(f, "Feature {} is not active", id),
            ProtocolError::UnauthorizedSender => {
                write!(f, "Sender is not authorized")
            }
        }
    }
}

impl Error for ProtocolError {}

impl From<PayloadError> for ProtocolError {
    fn from(error: PayloadError) -> Self {
        match error {
            PayloadError::UnknownType { tx_type, version } => {
                ProtocolError::UnknownType { tx_type, version }
            }
            other => ProtocolError::MalformedPayload(other.to_string()),
        }
    }
}

/// Fatal engine errors. Processing must stop when one of these occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Undo history missing or state checksum mismatch after rollback
    ReorgInconsistency(String),
    /// Block does not extend the current tip
    OutOfOrderBlock { expected: u32, got: u32 },
    /// Block's parent is not the current tip
    ParentMismatch {
        height: u32,
        expected: String,
        got: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ReorgInconsistency(msg) => write!(f, "Reorg inconsistency: {}", msg),
            EngineError::OutOfOrderBlock { expected, got } => write!(
                f,
                "Out of order block: expected height {}, got {}",
                expected, got
            ),
            EngineError::ParentMismatch {
                height,
                expected,
                got,
            } => write!(
                f,
                "Block {} does not extend the tip: expected parent {}, got {}",
                height, expected, got
            ),
        }
    }
}

impl Error for EngineError {}

/// Error type for block processing operations
#[derive(Debug)]
pub enum BlockProcessorError {
    ChainSourceError(ChainSourceError),
    EngineError(EngineError),
    StoreError(StoreError),
    ProcessingError(String),
}

impl fmt::Display for BlockProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockProcessorError::ChainSourceError(e) => write!(f, "Chain source error: {}", e),
            BlockProcessorError::EngineError(e) => write!(f, "Engine error: {}", e),
            BlockProcessorError::StoreError(e) => write!(f, "State store error: {}", e),
            BlockProcessorError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl Error for BlockProcessorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BlockProcessorError::ChainSourceError(e) => Some(e),
            BlockProcessorError::EngineError(e) => Some(e),
            BlockProcessorError::StoreError(e) => Some(e),
            BlockProcessorError::ProcessingError(_) => None,
        }
    }
}

impl From<ChainSourceError> for BlockProcessorError {
    fn from(error: ChainSourceError) -> Self {
        BlockProcessorError::ChainSourceError(error)
    }
}

impl From<EngineError> for BlockProcessorError {
    fn from(error: EngineError) -> Self {
        BlockProcessorError::EngineError(error)
    }
}

impl From<StoreError> for BlockProcessorError {
    fn from(error: StoreError) -> Self {
        BlockProcessorError::StoreError(error)
    }
}
