//! The embedded instruction forwarded on behalf of a funded account

use serde::{Deserialize, Serialize};

use crate::{AccountName, CodecError, Decoder, Encoder};

/// A destination-ledger instruction carried in an event's extra payload.
///
/// Decoded but never executed here; the router appends the funded account's
/// active authorization and hands it to the outbound dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub target: AccountName,
    pub entrypoint: String,
    pub payload: Vec<u8>,
}

impl Instruction {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut enc = Encoder::new();
        put_prefixed(&mut enc, self.target.as_str().as_bytes())?;
        put_prefixed(&mut enc, self.entrypoint.as_bytes())?;
        enc.put_raw(&self.payload);
        Ok(enc.into_bytes())
    }

    /// Decode an instruction from discriminator-stripped extra bytes.
    ///
    /// `Ok(None)` means the payload names no target: nothing to forward,
    /// not an error.
    pub fn decode(data: &[u8]) -> Result<Option<Self>, CodecError> {
        let mut dec = Decoder::new(data);
        let target = take_prefixed(&mut dec)?;
        if target.is_empty() {
            return Ok(None);
        }
        let target = AccountName::new(String::from_utf8_lossy(target).into_owned());
        let entrypoint = String::from_utf8_lossy(take_prefixed(&mut dec)?).into_owned();
        let payload = dec.take(dec.remaining())?.to_vec();
        Ok(Some(Self {
            target,
            entrypoint,
            payload,
        }))
    }
}

fn put_prefixed(enc: &mut Encoder, bytes: &[u8]) -> Result<(), CodecError> {
    if bytes.len() > u16::MAX as usize {
        return Err(CodecError::LengthOverflow {
            length: bytes.len(),
            bound: u16::MAX as usize,
        });
    }
    enc.put_u16_be(bytes.len() as u16);
    enc.put_raw(bytes);
    Ok(())
}

fn take_prefixed<'a>(dec: &mut Decoder<'a>) -> Result<&'a [u8], CodecError> {
    let len = dec.u16_be()? as usize;
    dec.take(len)
}
