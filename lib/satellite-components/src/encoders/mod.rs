//! Payload encoders.

use bytes::{Bytes, BytesMut};
use satellite_error::{ErrorContext as _, GenericError};

/// Converts a typed payload into the bytes sent over the wire.
///
/// Encoders are stateless from the caller's point of view and may be shared across concurrent forwarding calls.
pub trait PayloadEncoder<T>: Send + Sync {
    /// Encodes the payload.
    ///
    /// Encoding must be deterministic: the same payload always produces the same bytes.
    ///
    /// # Errors
    ///
    /// If the payload cannot be encoded, an error is returned.
    fn encode(&self, payload: &T) -> Result<Bytes, GenericError>;
}

/// Encodes payloads using their Protocol Buffers schema.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtobufEncoder;

impl<T> PayloadEncoder<T> for ProtobufEncoder
where
    T: prost::Message,
{
    fn encode(&self, payload: &T) -> Result<Bytes, GenericError> {
        let mut buf = BytesMut::with_capacity(payload.encoded_len());
        payload
            .encode(&mut buf)
            .error_context("Failed to encode payload as Protocol Buffers.")?;
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use prost::Message as _;
    use satellite_core::data_model::event::meter::{meter_data::Metric, Label, MeterData, MeterSingleValue};

    use super::*;

    fn jvm_heap_meter() -> MeterData {
        MeterData {
            metric: Some(Metric::SingleValue(MeterSingleValue {
                name: "jvm_memory_heap_used".to_string(),
                labels: vec![Label {
                    name: "area".to_string(),
                    value: "heap".to_string(),
                }],
                value: 1048576.0,
            })),
            service: "orders".to_string(),
            service_instance: "orders-7c9f".to_string(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn matches_canonical_encoding() {
        let meter = jvm_heap_meter();
        let encoded = ProtobufEncoder.encode(&meter).unwrap();
        assert_eq!(encoded.as_ref(), meter.encode_to_vec().as_slice());
    }

    #[test]
    fn deterministic() {
        let meter = jvm_heap_meter();
        let first = ProtobufEncoder.encode(&meter).unwrap();
        let second = ProtobufEncoder.encode(&meter).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_message_encodes_to_nothing() {
        let encoded = ProtobufEncoder.encode(&MeterData::default()).unwrap();
        assert!(encoded.is_empty());
    }
}
