//! Crossgate Crypto - primitives consumed by the event pipeline
//!
//! Events are authenticated by recoverable secp256k1 signatures over the
//! sha256 digest of their signed span. The quorum checker counts distinct
//! valid signatures against the signer roster and succeeds at 2N/3 + 1.

pub mod hash;
pub mod quorum;
pub mod signature;

pub use hash::*;
pub use quorum::*;
pub use signature::*;

use thiserror::Error;

/// Errors from signature recovery and quorum verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Signature recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Invalid public key encoding: {0}")]
    InvalidKey(String),

    #[error("Duplicated signature in the candidate list")]
    DuplicatedSignature,

    #[error("Not enough valid signatures: {valid} of {threshold} required")]
    NotEnoughSignatures { valid: usize, threshold: usize },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
