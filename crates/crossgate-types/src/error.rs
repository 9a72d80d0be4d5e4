//! Error types shared by the codec and quantity layers

use thiserror::Error;

/// Errors decoding or encoding wire payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Unexpected end of input at offset {offset}, needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("Varuint is malformed or exceeds 32 bits")]
    BadVaruint,

    #[error("Length prefix {length} exceeds the declared bound {bound}")]
    LengthOverflow { length: usize, bound: usize },

    #[error("Trailing {0} bytes after the decoded value")]
    TrailingBytes(usize),

    #[error("Invalid extra discriminator {0:#04x}")]
    BadDiscriminator(u8),
}

/// Errors narrowing event amounts into the local asset representation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount {amount} exceeds the 2^62 - 1 ceiling")]
    TooLarge { amount: u128 },

    #[error("Amount overflow during arithmetic operation")]
    Overflow,

    #[error("Amount underflow during arithmetic operation")]
    Underflow,
}
