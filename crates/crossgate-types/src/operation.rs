//! The out-of-band operation payload
//!
//! Large event extras arrive out of band: the event itself only commits to
//! their hash, and a later call supplies the payload, which decodes into an
//! `Operation`. Unlike the event codec this format uses big-endian u16
//! prefixes throughout.

use serde::{Deserialize, Serialize};

use crate::{CodecError, Decoder, Encoder, ProcessId};

pub const PURPOSE_UNKNOWN: u16 = 0;
pub const PURPOSE_GROUP_EVENT: u16 = 1;
pub const PURPOSE_ADD_PROCESS: u16 = 11;
pub const PURPOSE_CREDIT_PROCESS: u16 = 12;

/// An operation wrapped in an out-of-band payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub purpose: u16,
    pub process: ProcessId,
    pub platform: String,
    pub address: String,
    pub extra: Vec<u8>,
}

impl Operation {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut enc = Encoder::new();
        enc.put_u16_be(self.purpose);
        enc.put_uuid(&self.process.0);
        put_prefixed(&mut enc, self.platform.as_bytes())?;
        put_prefixed(&mut enc, self.address.as_bytes())?;
        put_prefixed(&mut enc, &self.extra)?;
        Ok(enc.into_bytes())
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(data);
        let purpose = dec.u16_be()?;
        let process = ProcessId(dec.uuid()?);
        let platform = String::from_utf8_lossy(take_prefixed(&mut dec)?).into_owned();
        let address = String::from_utf8_lossy(take_prefixed(&mut dec)?).into_owned();
        let extra = take_prefixed(&mut dec)?.to_vec();
        dec.expect_end()?;
        Ok(Self {
            purpose,
            process,
            platform,
            address,
            extra,
        })
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
