//! Payload codec
//!
//! - `types`: the closed set of payload variants and type identifiers
//! - `decoder`: bytes to payload, failing softly on malformed input
//! - `encoder`: payload to bytes, used by submission and tests

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::{decode_payload, decode_payload_hex, peek_header};
pub use encoder::{encode, encode_hex, encode_payload};
pub use types::{tx_type, type_name, DecodedPayload, Payload, PayloadError};
