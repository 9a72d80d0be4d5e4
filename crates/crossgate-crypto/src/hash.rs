//! Content hashing

use sha2::{Digest, Sha256};

/// Sha256 digest of a byte string.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Check an out-of-band payload against the commitment embedded in an event.
pub fn matches_commitment(payload: &[u8], commitment: &[u8; 32]) -> bool {
    sha256(payload) == *commitment
}
