use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{WireMessage, MAX_MESSAGE_SIZE};

/// Codec for data-access protocol frames.
pub struct DalCodec;

impl DalCodec {
    /// Encode a message with framing: [4 bytes len][1 byte tag][JSON payload]
    pub fn encode<M: WireMessage>(msg: &M) -> ProtocolResult<Vec<u8>> {
        let payload = Self::encode_payload(msg)?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = Vec::with_capacity(4 + 1 + payload.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(msg.type_tag());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode a framed message. Returns (message, bytes_consumed).
    pub fn decode<M: WireMessage>(data: &[u8]) -> ProtocolResult<(M, usize)> {
        if data.len() < 5 {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len < 1 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: len - 1,
                max: MAX_MESSAGE_SIZE,
            });
        }
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::FramingError(format!(
                "incomplete: have {}, need {}",
                data.len(),
                total
            )));
        }
        let tag = data[4];
        if !M::is_known_tag(tag) {
            return Err(ProtocolError::InvalidMessageType(tag));
        }
        let msg: M = Self::decode_payload(&data[5..total])?;
        if msg.type_tag() != tag {
            return Err(ProtocolError::FramingError(format!(
                "tag {tag} does not match payload {}",
                msg.type_name()
            )));
        }
        Ok((msg, total))
    }

    /// Encode payload only (no framing).
    pub fn encode_payload<M: WireMessage>(msg: &M) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Decode payload only (no framing).
    pub fn decode_payload<M: WireMessage>(data: &[u8]) -> ProtocolResult<M> {
        serde_json::from_slice(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}
