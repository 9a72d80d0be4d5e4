//! Byte-exact wire codec primitives
//!
//! The signed span of an event must be verified byte-for-byte against the
//! relay's serialization, so events never go through serde. Fixed-width
//! integers are little-endian; list and byte-string lengths are varuint32;
//! the out-of-band operation payload uses big-endian u16 prefixes instead
//! (see `operation`).

use uuid::Uuid;

use crate::CodecError;

/// Append-only byte encoder.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_i32_le(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64_le(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u128_le(&mut self, v: u128) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u16_be(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_varuint(&mut self, mut v: u32) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.buf.push(byte);
                break;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Varuint-prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_varuint(bytes.len() as u32);
        self.put_raw(bytes);
    }

    pub fn put_uuid(&mut self, id: &Uuid) {
        self.put_raw(id.as_bytes());
    }
}

/// Cursor-based byte decoder.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read offset into the input.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn i32_le(&mut self) -> Result<i32, CodecError> {
        let b: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(i32::from_le_bytes(b))
    }

    pub fn u64_le(&mut self) -> Result<u64, CodecError> {
        let b: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(u64::from_le_bytes(b))
    }

    pub fn u128_le(&mut self) -> Result<u128, CodecError> {
        let b: [u8; 16] = self.take(16)?.try_into().unwrap();
        Ok(u128::from_le_bytes(b))
    }

    pub fn u16_be(&mut self) -> Result<u16, CodecError> {
        let b: [u8; 2] = self.take(2)?.try_into().unwrap();
        Ok(u16::from_be_bytes(b))
    }

    pub fn varuint(&mut self) -> Result<u32, CodecError> {
        let mut out: u32 = 0;
        let mut shift = 0;
        loop {
            let byte = self.u8()?;
            if shift >= 32 {
                return Err(CodecError::BadVaruint);
            }
            out |= ((byte & 0x7f) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(out);
            }
            shift += 7;
        }
    }

    /// Varuint-prefixed byte string.
    pub fn bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.varuint()? as usize;
        self.take(len)
    }

    pub fn uuid(&mut self) -> Result<Uuid, CodecError> {
        let b: [u8; 16] = self.take(16)?.try_into().unwrap();
        Ok(Uuid::from_bytes(b))
    }

    /// Fail if input remains past the decoded value.
    pub fn expect_end(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
