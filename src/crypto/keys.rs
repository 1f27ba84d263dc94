// crypto/keys.rs - Ed25519 Keys for Ring Identities

use ed25519_dalek::{
    Signer, SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors related to key handling and signature checks
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid public key bytes")]
    InvalidKey,

    #[error("Invalid signature")]
    InvalidSignature,
}

/// An Ed25519 signing pair held by the local peer.
///
/// The ring itself only ever stores public keys; the pair exists to mint
/// and countersign key exchange messages.
pub struct Keypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a fresh random pair
    pub fn generate() -> Self {
        let mut secret_bytes = [0u8; SECRET_KEY_LENGTH];
        rand::rng().fill_bytes(&mut secret_bytes);

        let signing_key = SigningKey::from_bytes(&secret_bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild a pair from existing secret key bytes
    pub fn from_secret_bytes(secret_bytes: &[u8]) -> Result<Self, KeyError> {
        if secret_bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidKeyLength {
                expected: SECRET_KEY_LENGTH,
                got: secret_bytes.len(),
            });
        }

        let mut key_bytes = [0u8; SECRET_KEY_LENGTH];
        key_bytes.copy_from_slice(secret_bytes);

        let signing_key = SigningKey::from_bytes(&key_bytes);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// The public half of the pair
    pub fn public(&self) -> VerifyingKey {
        self.verifying_key
    }

    /// Sign arbitrary data
    pub fn sign(&self, data: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.signing_key.sign(data).to_bytes()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &fingerprint(&self.verifying_key))
            .finish()
    }
}

/// Wire encoding of a public key
pub fn serialize_key(key: &VerifyingKey) -> Vec<u8> {
    key.to_bytes().to_vec()
}

/// Decode a public key from its wire bytes, rejecting malformed input
pub fn deserialize_key(bytes: &[u8]) -> Result<VerifyingKey, KeyError> {
    if bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(KeyError::InvalidKeyLength {
            expected: PUBLIC_KEY_LENGTH,
            got: bytes.len(),
        });
    }

    let mut key_bytes = [0u8; PUBLIC_KEY_LENGTH];
    key_bytes.copy_from_slice(bytes);
    VerifyingKey::from_bytes(&key_bytes).map_err(|_| KeyError::InvalidKey)
}

/// Short hex fingerprint of a public key (first 8 bytes of its SHA-256),
/// for log lines and snapshots
pub fn fingerprint(key: &VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct_pairs() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let kp = Keypair::generate();
        let bytes = serialize_key(&kp.public());
        let back = deserialize_key(&bytes).unwrap();
        assert_eq!(back, kp.public());
    }

    #[test]
    fn test_deserialize_rejects_bad_length() {
        assert!(matches!(
            deserialize_key(&[0u8; 7]),
            Err(KeyError::InvalidKeyLength { expected: 32, got: 7 })
        ));
    }

    #[test]
    fn test_from_secret_bytes() {
        let kp = Keypair::generate();
        let again = Keypair::from_secret_bytes(&kp.signing_key.to_bytes()).unwrap();
        assert_eq!(kp.public(), again.public());
    }

    #[test]
    fn test_fingerprint_is_short_hex() {
        let kp = Keypair::generate();
        let fp = fingerprint(&kp.public());
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
