//! Binary payload encoder, the inverse of the decoder

use super::types::{tx_type, DecodedPayload, Payload};
use crate::domain::models::PropertyMetadata;

#[derive(Default)]
struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Writes at most 255 bytes followed by the terminator
    fn string(&mut self, v: &str) -> &mut Self {
        let bytes = v.as_bytes();
        let len = bytes.len().min(255);
        self.buf.extend_from_slice(&bytes[..len]);
        self.buf.push(0);
        self
    }

    fn metadata(&mut self, m: &PropertyMetadata) -> &mut Self {
        self.string(&m.category)
            .string(&m.subcategory)
            .string(&m.name)
            .string(&m.url)
            .string(&m.data)
    }
}

/// Encode a payload with an explicit version
pub fn encode_payload(decoded: &DecodedPayload) -> Vec<u8> {
    let mut w = PayloadWriter::default();
    w.u16(decoded.version).u16(decoded.payload.tx_type());

    match &decoded.payload {
        Payload::SimpleSend { property, amount } | Payload::DexAcceptOffer { property, amount } => {
            w.u32(*property).u64(*amount);
        }
        Payload::SendToOwners {
            property,
            amount,
            distribution_property,
        } => {
            w.u32(*property).u64(*amount);
            if let Some(distribution) = distribution_property {
                w.u32(*distribution);
            }
        }
        Payload::SendAll { ecosystem } => {
            w.u8(*ecosystem);
        }
        Payload::DexSellOffer {
            property,
            amount,
            desired,
            time_limit,
            min_fee,
            action,
        } => {
            w.u32(*property)
                .u64(*amount)
                .u64(*desired)
                .u8(*time_limit)
                .u64(*min_fee)
                .u8(action.to_u8());
        }
        Payload::CreatePropertyFixed {
            ecosystem,
            property_type,
            previous_property,
            metadata,
            amount,
        } => {
            w.u8(*ecosystem)
                .u16(*property_type)
                .u32(*previous_property)
                .metadata(metadata)
                .u64(*amount);
        }
        Payload::CreatePropertyVariable {
            ecosystem,
            property_type,
            previous_property,
            metadata,
            desired_property,
            tokens_per_unit,
            deadline,
            early_bonus,
            issuer_percent,
        } => {
            w.u8(*ecosystem)
                .u16(*property_type)
                .u32(*previous_property)
                .metadata(metadata)
                .u32(*desired_property)
                .u64(*tokens_per_unit)
                .u64(*deadline)
                .u8(*early_bonus)
                .u8(*issuer_percent);
        }
        Payload::CloseCrowdsale { property } => {
            w.u32(*property);
        }
        Payload::CreatePropertyManual {
            ecosystem,
            property_type,
            previous_property,
            metadata,
        } => {
            w.u8(*ecosystem)
                .u16(*property_type)
                .u32(*previous_property)
                .metadata(metadata);
        }
        Payload::GrantTokens {
            property,
            amount,
            memo,
        }
        | Payload::RevokeTokens {
            property,
            amount,
            memo,
        } => {
            w.u32(*property).u64(*amount).string(memo);
        }
        Payload::Deactivation { feature_id } => {
            w.u16(*feature_id);
        }
        Payload::Activation {
            feature_id,
            activation_block,
            min_client_version,
        } => {
            w.u16(*feature_id).u32(*activation_block).u32(*min_client_version);
        }
    }

    w.buf
}

/// Encode a payload with the default version for its type
pub fn encode(payload: Payload) -> Vec<u8> {
    encode_payload(&DecodedPayload::new(default_version(&payload), payload))
}

/// Hex form of `encode`
pub fn encode_hex(payload: Payload) -> String {
    hex::encode(encode(payload))
}

/// Lowest version able to carry the payload
pub fn default_version(payload: &Payload) -> u16 {
    match payload {
        Payload::SendToOwners {
            distribution_property: Some(_),
            ..
        } => 1,
        Payload::DexSellOffer { .. } => 1,
        Payload::Deactivation { .. } | Payload::Activation { .. } => tx_type::CONTROL_VERSION,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::OfferAction;
    use crate::domain::services::payload::decode_payload;

    #[test]
    fn test_encode_simple_send_vector() {
        let hex = encode_hex(Payload::SimpleSend {
            property: 4,
            amount: 1,
        });
        assert_eq!(hex, "00000000000000040000000000000001");
    }

    #[test]
    fn test_encode_dex_offer_vector() {
        let hex = encode_hex(Payload::DexSellOffer {
            property: 4,
            amount: 100_000_000,
            desired: 1_500_000_000,
            time_limit: 10,
            min_fee: 1000,
            action: OfferAction::New,
        });
        assert_eq!(
            hex,
            "00010014000000040000000005f5e1000000000059682f000a00000000000003e801"
        );
    }

    #[test]
    fn test_encode_fixed_issuance_vector() {
        let hex = encode_hex(Payload::CreatePropertyFixed {
            ecosystem: 2,
            property_type: 2,
            previous_property: 0,
            metadata: PropertyMetadata {
                name: "TDiv".to_string(),
                ..Default::default()
            },
            amount: 1_000_000,
        });
        assert_eq!(hex, "000000320200020000000000005444697600000000000000000f4240");
    }

    #[test]
    fn test_encode_activation_decodes_back() {
        let payload = Payload::Activation {
            feature_id: 3,
            activation_block: 120,
            min_client_version: 999,
        };
        let decoded = decode_payload(&encode(payload.clone())).unwrap();
        assert_eq!(decoded.version, tx_type::CONTROL_VERSION);
        assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn test_long_strings_are_truncated() {
        let payload = Payload::CreatePropertyManual {
            ecosystem: 1,
            property_type: 1,
            previous_property: 0,
            metadata: PropertyMetadata {
                name: "x".repeat(300),
                ..Default::default()
            },
        };
        let decoded = decode_payload(&encode(payload)).unwrap();
        match decoded.payload {
            Payload::CreatePropertyManual { metadata, .. } => assert_eq!(metadata.name.len(), 255),
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
