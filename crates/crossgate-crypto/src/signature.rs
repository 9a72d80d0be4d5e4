//! Recoverable secp256k1 signatures
//!
//! The wire format is 65 bytes: one recovery-id byte followed by the 64-byte
//! r || s pair. Verification never takes a public key as input; the key is
//! recovered from the digest and checked for roster membership.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crossgate_types::EventSignature;

use crate::{CryptoError, CryptoResult};

/// A compressed SEC1 public key of a roster signer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 33]);

impl PublicKey {
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let arr: [u8; 33] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("public key must be 33 bytes".to_string()))?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let arr: [u8; 33] = point.as_bytes().try_into().expect("compressed sec1 point");
        Self(arr)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// A signing key pair for a roster member.
///
/// Production rosters are provisioned out of band; key pairs here exist for
/// relays and tests that need to produce well-formed events.
pub struct KeyPair {
    signing: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing.verifying_key())
    }

    /// Sign a 32-byte digest, producing the 65-byte recoverable wire form.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> CryptoResult<EventSignature> {
        let (signature, recovery_id) = self
            .signing
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut out = [0u8; 65];
        out[0] = recovery_id.to_byte();
        out[1..].copy_from_slice(&signature.to_bytes());
        Ok(EventSignature(out))
    }
}

/// Recover the signer's public key from a digest and a wire signature.
pub fn recover_key(digest: &[u8; 32], signature: &EventSignature) -> CryptoResult<PublicKey> {
    let recovery_id = RecoveryId::from_byte(signature.recovery_id())
        .ok_or_else(|| CryptoError::RecoveryFailed("bad recovery id".to_string()))?;
    let ecdsa = EcdsaSignature::from_slice(signature.rs_bytes())
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(digest, &ecdsa, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    Ok(PublicKey::from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use crate::hash::sha256;

    use super::*;

    #[test]
    fn sign_and_recover() {
        let pair = KeyPair::generate();
        let digest = sha256(b"signed event span");
        let signature = pair.sign_digest(&digest).unwrap();
        assert_eq!(recover_key(&digest, &signature).unwrap(), pair.public_key());
    }

    #[test]
    fn recover_with_wrong_digest_yields_other_key() {
        let pair = KeyPair::generate();
        let digest = sha256(b"signed event span");
        let signature = pair.sign_digest(&digest).unwrap();

        let other = sha256(b"different span");
        match recover_key(&other, &signature) {
            Ok(key) => assert_ne!(key, pair.public_key()),
            Err(CryptoError::RecoveryFailed(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn public_key_hex_round_trip() {
        let key = KeyPair::generate().public_key();
        assert_eq!(PublicKey::from_hex(&key.to_hex()).unwrap(), key);
    }
}
