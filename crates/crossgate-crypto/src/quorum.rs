//! Quorum verification against the signer roster
//!
//! The roster is read by the caller at verification time (it may rotate
//! between calls), so nothing here caches across invocations.

use crossgate_types::EventSignature;

use crate::{recover_key, sha256, CryptoError, CryptoResult};
use crate::signature::PublicKey;

/// Signatures required for a roster of `roster_size` signers.
pub fn quorum_threshold(roster_size: usize) -> usize {
    roster_size * 2 / 3 + 1
}

/// Verify that `signatures` carry a quorum of the roster over `signed_bytes`.
///
/// Counts distinct valid signatures and succeeds as soon as the threshold is
/// reached. A repeated signature aborts; a signature recovering to a key
/// outside the roster merely does not count.
pub fn verify_quorum(
    signed_bytes: &[u8],
    signatures: &[EventSignature],
    roster: &[PublicKey],
) -> CryptoResult<()> {
    let digest = sha256(signed_bytes);
    let threshold = quorum_threshold(roster.len());

    let mut seen: Vec<&EventSignature> = Vec::with_capacity(signatures.len());
    let mut valid = 0usize;

    for signature in signatures {
        if seen.iter().any(|s| s.0 == signature.0) {
            return Err(CryptoError::DuplicatedSignature);
        }
        seen.push(signature);

        if let Ok(key) = recover_key(&digest, signature) {
            if roster.contains(&key) {
                valid += 1;
            }
        }
        if valid >= threshold {
            return Ok(());
        }
    }

    Err(CryptoError::NotEnoughSignatures { valid, threshold })
}

#[cfg(test)]
mod tests {
    use crate::KeyPair;

    use super::*;

    fn sign_all(pairs: &[KeyPair], data: &[u8]) -> Vec<EventSignature> {
        let digest = sha256(data);
        pairs.iter().map(|p| p.sign_digest(&digest).unwrap()).collect()
    }

    #[test]
    fn threshold_values() {
        assert_eq!(quorum_threshold(1), 1);
        assert_eq!(quorum_threshold(3), 3);
        assert_eq!(quorum_threshold(4), 3);
        assert_eq!(quorum_threshold(7), 5);
    }

    #[test]
    fn four_signer_roster_needs_three() {
        let pairs: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate()).collect();
        let roster: Vec<PublicKey> = pairs.iter().map(|p| p.public_key()).collect();
        let data = b"signed span";
        let signatures = sign_all(&pairs, data);

        assert!(matches!(
            verify_quorum(data, &signatures[..2], &roster),
            Err(CryptoError::NotEnoughSignatures { valid: 2, threshold: 3 })
        ));
        assert!(verify_quorum(data, &signatures[..3], &roster).is_ok());
        assert!(verify_quorum(data, &signatures, &roster).is_ok());
    }

    #[test]
    fn duplicated_signature_aborts() {
        let pairs: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate()).collect();
        let roster: Vec<PublicKey> = pairs.iter().map(|p| p.public_key()).collect();
        let data = b"signed span";
        let mut signatures = sign_all(&pairs[..2], data);
        signatures.push(signatures[0]);

        assert_eq!(
            verify_quorum(data, &signatures, &roster),
            Err(CryptoError::DuplicatedSignature)
        );
    }

    #[test]
    fn outsider_signatures_do_not_count() {
        let pairs: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate()).collect();
        let roster: Vec<PublicKey> = pairs.iter().map(|p| p.public_key()).collect();
        let outsiders: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let data = b"signed span";

        let mut signatures = sign_all(&pairs[..2], data);
        signatures.extend(sign_all(&outsiders, data));

        assert!(matches!(
            verify_quorum(data, &signatures, &roster),
            Err(CryptoError::NotEnoughSignatures { valid: 2, .. })
        ));
    }

    #[test]
    fn signatures_over_other_bytes_do_not_count() {
        let pairs: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let roster: Vec<PublicKey> = pairs.iter().map(|p| p.public_key()).collect();
        let signatures = sign_all(&pairs, b"some other span");

        assert!(verify_quorum(b"signed span", &signatures, &roster).is_err());
    }
}
