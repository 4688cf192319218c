//! Binary payload decoder
//!
//! Layout: version u16, type u16, then type-specific fields. All integers are
//! big-endian; strings are NUL-terminated and at most 255 bytes long.
//! Trailing bytes after the last field are ignored.

use super::types::{tx_type, DecodedPayload, Payload, PayloadError};
use crate::domain::models::{OfferAction, PropertyMetadata};

const MAX_STRING_LEN: usize = 255;

struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], PayloadError> {
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(PayloadError::Truncated {
                field,
                offset: self.pos,
            });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, PayloadError> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, PayloadError> {
        let bytes = self.take(2, field)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, PayloadError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4, field)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, PayloadError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, field)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn string(&mut self, field: &'static str) -> Result<String, PayloadError> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let terminator = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(PayloadError::UnterminatedString { field })?;
        if terminator > MAX_STRING_LEN {
            return Err(PayloadError::StringTooLong { field });
        }
        let text = String::from_utf8_lossy(&rest[..terminator]).into_owned();
        self.pos += terminator + 1;
        Ok(text)
    }

    fn metadata(&mut self) -> Result<PropertyMetadata, PayloadError> {
        Ok(PropertyMetadata {
            category: self.string("category")?,
            subcategory: self.string("subcategory")?,
            name: self.string("name")?,
            url: self.string("url")?,
            data: self.string("data")?,
        })
    }
}

/// Decode a raw payload. Never panics; malformed input yields an error.
pub fn decode_payload(data: &[u8]) -> Result<DecodedPayload, PayloadError> {
    if data.len() < 4 {
        return Err(PayloadError::MissingHeader);
    }
    let mut r = PayloadReader::new(data);
    let version = r.u16("version")?;
    let tx = r.u16("type")?;
    let unknown = || PayloadError::UnknownType {
        tx_type: tx,
        version,
    };

    let payload = match (tx, version) {
        (tx_type::SIMPLE_SEND, 0) => Payload::SimpleSend {
            property: r.u32("property")?,
            amount: r.u64("amount")?,
        },
        (tx_type::SEND_TO_OWNERS, 0) => Payload::SendToOwners {
            property: r.u32("property")?,
            amount: r.u64("amount")?,
            distribution_property: None,
        },
        (tx_type::SEND_TO_OWNERS, 1) => Payload::SendToOwners {
            property: r.u32("property")?,
            amount: r.u64("amount")?,
            distribution_property: Some(r.u32("distribution property")?),
        },
        (tx_type::SEND_ALL, 0) => Payload::SendAll {
            ecosystem: r.u8("ecosystem")?,
        },
        (tx_type::DEX_SELL_OFFER, 0 | 1) => {
            let property = r.u32("property")?;
            let amount = r.u64("amount")?;
            let desired = r.u64("desired")?;
            let time_limit = r.u8("time limit")?;
            let min_fee = r.u64("min fee")?;
            let raw_action = r.u8("action")?;
            let action = OfferAction::from_u8(raw_action).ok_or(PayloadError::InvalidField {
                field: "action",
                value: u64::from(raw_action),
            })?;
            Payload::DexSellOffer {
                property,
                amount,
                desired,
                time_limit,
                min_fee,
                action,
            }
        }
        (tx_type::DEX_ACCEPT_OFFER, 0) => Payload::DexAcceptOffer {
            property: r.u32("property")?,
            amount: r.u64("amount")?,
        },
        (tx_type::CREATE_PROPERTY_FIXED, 0) => Payload::CreatePropertyFixed {
            ecosystem: r.u8("ecosystem")?,
            property_type: r.u16("property type")?,
            previous_property: r.u32("previous property")?,
            metadata: r.metadata()?,
            amount: r.u64("amount")?,
        },
        (tx_type::CREATE_PROPERTY_VARIABLE, 0) => Payload::CreatePropertyVariable {
            ecosystem: r.u8("ecosystem")?,
            property_type: r.u16("property type")?,
            previous_property: r.u32("previous property")?,
            metadata: r.metadata()?,
            desired_property: r.u32("desired property")?,
            tokens_per_unit: r.u64("tokens per unit")?,
            deadline: r.u64("deadline")?,
            early_bonus: r.u8("early bonus")?,
            issuer_percent: r.u8("issuer percent")?,
        },
        (tx_type::CLOSE_CROWDSALE, 0) => Payload::CloseCrowdsale {
            property: r.u32("property")?,
        },
        (tx_type::CREATE_PROPERTY_MANUAL, 0) => Payload::CreatePropertyManual {
            ecosystem: r.u8("ecosystem")?,
            property_type: r.u16("property type")?,
            previous_property: r.u32("previous property")?,
            metadata: r.metadata()?,
        },
        (tx_type::GRANT_PROPERTY_TOKENS, 0) => Payload::GrantTokens {
            property: r.u32("property")?,
            amount: r.u64("amount")?,
            memo: r.string("memo")?,
        },
        (tx_type::REVOKE_PROPERTY_TOKENS, 0) => Payload::RevokeTokens {
            property: r.u32("property")?,
            amount: r.u64("amount")?,
            memo: r.string("memo")?,
        },
        (tx_type::DEACTIVATION, tx_type::CONTROL_VERSION) => Payload::Deactivation {
            feature_id: r.u16("feature id")?,
        },
        (tx_type::ACTIVATION, tx_type::CONTROL_VERSION) => Payload::Activation {
            feature_id: r.u16("feature id")?,
            activation_block: r.u32("activation block")?,
            min_client_version: r.u32("min client version")?,
        },
        _ => return Err(unknown()),
    };

    Ok(DecodedPayload::new(version, payload))
}

/// Decode a hex encoded payload
pub fn decode_payload_hex(payload_hex: &str) -> Result<DecodedPayload, PayloadError> {
    let bytes = hex::decode(payload_hex.trim()).map_err(|_| PayloadError::MissingHeader)?;
    decode_payload(&bytes)
}

/// Reads the header without decoding the body
pub fn peek_header(data: &[u8]) -> Option<(u16, u16)> {
    if data.len() < 4 {
        return None;
    }
    Some((
        u16::from_be_bytes([data[0], data[1]]),
        u16::from_be_bytes([data[2], data[3]]),
    ))
}
