//! The signed transfer event emitted by the source network
//!
//! Layout of the wire format, in order:
//!
//! ```text
//! nonce u64 | process [16] | asset [16] | members varuint + n*[16] |
//! threshold i32 | amount u128 | extra varuint + bytes | timestamp u64 |
//! signatures varuint + n*[65]
//! ```
//!
//! The signed span is everything up to but excluding the signature-list
//! count byte; `TxEvent::decode` reports its length so callers can verify
//! the exact bytes the roster signed.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{AssetId, CodecError, Decoder, Encoder, MemberId, ProcessId};

/// Extra-payload discriminator: the instruction follows inline.
pub const EXTRA_DIRECT: u8 = 0;

/// Extra-payload discriminator: the instruction arrives out of band,
/// committed to by the 32-byte hash that follows.
pub const EXTRA_INDIRECT: u8 = 1;

/// A 65-byte recoverable signature (recovery id followed by r || s).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EventSignature(pub [u8; 65]);

impl EventSignature {
    pub const SIZE: usize = 65;

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 65] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[0]
    }

    pub fn rs_bytes(&self) -> &[u8] {
        &self.0[1..]
    }
}

impl fmt::Debug for EventSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventSignature({})", hex::encode(self.0))
    }
}

impl Serialize for EventSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for EventSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(D::Error::custom)?;
        Self::from_slice(&bytes).ok_or_else(|| D::Error::custom("signature must be 65 bytes"))
    }
}

/// A signed, sequenced transfer event. Immutable once authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEvent {
    pub nonce: u64,
    pub process: ProcessId,
    pub asset: AssetId,
    pub members: Vec<MemberId>,
    pub threshold: i32,
    pub amount: u128,
    pub extra: Vec<u8>,
    pub timestamp: u64,
    pub signatures: Vec<EventSignature>,
}

impl TxEvent {
    /// Serialize the signed span only (everything before the signatures).
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.put_u64_le(self.nonce);
        enc.put_uuid(&self.process.0);
        enc.put_uuid(&self.asset.0);
        enc.put_varuint(self.members.len() as u32);
        for member in &self.members {
            enc.put_uuid(&member.0);
        }
        enc.put_i32_le(self.threshold);
        enc.put_u128_le(self.amount);
        enc.put_bytes(&self.extra);
        enc.put_u64_le(self.timestamp);
        enc.into_bytes()
    }

    /// Serialize the full event, signatures included.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.signed_bytes();
        let mut enc = Encoder::new();
        enc.put_varuint(self.signatures.len() as u32);
        for sig in &self.signatures {
            enc.put_raw(&sig.0);
        }
        out.extend_from_slice(&enc.into_bytes());
        out
    }

    /// Decode an event and report the length of its signed span.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), CodecError> {
        let mut dec = Decoder::new(data);

        let nonce = dec.u64_le()?;
        let process = ProcessId(dec.uuid()?);
        let asset = AssetId(dec.uuid()?);

        let member_count = dec.varuint()? as usize;
        let mut members = Vec::with_capacity(member_count.min(64));
        for _ in 0..member_count {
            members.push(MemberId(dec.uuid()?));
        }

        let threshold = dec.i32_le()?;
        let amount = dec.u128_le()?;
        let extra = dec.bytes()?.to_vec();
        let timestamp = dec.u64_le()?;

        let signed_len = dec.pos();

        let sig_count = dec.varuint()? as usize;
        let mut signatures = Vec::with_capacity(sig_count.min(64));
        for _ in 0..sig_count {
            let raw = dec.take(EventSignature::SIZE)?;
            let mut sig = [0u8; EventSignature::SIZE];
            sig.copy_from_slice(raw);
            signatures.push(EventSignature(sig));
        }
        dec.expect_end()?;

        Ok((
            Self {
                nonce,
                process,
                asset,
                members,
                threshold,
                amount,
                extra,
                timestamp,
                signatures,
            },
            signed_len,
        ))
    }

    /// Event timestamp truncated to whole seconds.
    pub fn timestamp_secs(&self) -> u64 {
        self.timestamp / 1_000_000_000
    }

    /// Discriminator byte of the extra payload, if any.
    pub fn extra_kind(&self) -> Option<u8> {
        self.extra.first().copied()
    }

    /// The 32-byte commitment embedded after an indirect discriminator.
    pub fn extra_commitment(&self) -> Result<[u8; 32], CodecError> {
        if self.extra.len() < 1 + 32 {
            return Err(CodecError::UnexpectedEof {
                offset: self.extra.len(),
                needed: 1 + 32 - self.extra.len(),
            });
        }
        let mut commitment = [0u8; 32];
        commitment.copy_from_slice(&self.extra[1..33]);
        Ok(commitment)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn sample_event() -> TxEvent {
        TxEvent {
            nonce: 7,
            process: ProcessId(Uuid::new_v4()),
            asset: AssetId(Uuid::new_v4()),
            members: vec![MemberId(Uuid::new_v4())],
            threshold: 1,
            amount: 1_000_000,
            extra: vec![EXTRA_DIRECT, 1, 2, 3],
            timestamp: 1_700_000_000_000_000_000,
            signatures: vec![EventSignature([0x11; 65]), EventSignature([0x22; 65])],
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let event = sample_event();
        let bytes = event.encode();
        let (decoded, signed_len) = TxEvent::decode(&bytes).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(&bytes[..signed_len], event.signed_bytes().as_slice());
    }

    #[test]
    fn signed_span_excludes_signatures() {
        let event = sample_event();
        let bytes = event.encode();
        let (_, signed_len) = TxEvent::decode(&bytes).unwrap();
        // count byte + two 65-byte signatures
        assert_eq!(bytes.len() - signed_len, 1 + 2 * 65);
    }

    #[test]
    fn truncated_event_fails() {
        let bytes = sample_event().encode();
        assert!(TxEvent::decode(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn trailing_garbage_fails() {
        let mut bytes = sample_event().encode();
        bytes.push(0);
        assert!(matches!(
            TxEvent::decode(&bytes),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn json_round_trip_keeps_signatures() {
        let event = sample_event();
        let json = serde_json::to_string(&event).unwrap();
        let back: TxEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn extra_commitment_requires_33_bytes() {
        let mut event = sample_event();
        event.extra = vec![EXTRA_INDIRECT; 10];
        assert!(event.extra_commitment().is_err());

        event.extra = vec![EXTRA_INDIRECT; 33];
        assert_eq!(event.extra_commitment().unwrap(), [EXTRA_INDIRECT; 32]);
    }
}
