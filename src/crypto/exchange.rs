// crypto/exchange.rs - Signed Key Exchange Messages

use ed25519_dalek::{Signature, Verifier, VerifyingKey, SIGNATURE_LENGTH};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::keys::{deserialize_key, serialize_key, KeyError, Keypair};

/// A signed attestation travelling on the gossip wire: `origin` asserts
/// that `owner` holds the public key encoded in `key_bytes`.
///
/// The ring treats the payload as opaque until the origin's own key is
/// trusted; until then the message sits in the pending queue.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyExchangeMessage {
    /// Identity of the signer
    pub origin: String,

    /// Identity the key is being attested for
    pub owner: String,

    /// Wire encoding of the attested public key
    pub key_bytes: Vec<u8>,

    /// Ed25519 signature by the origin over the canonical digest
    pub signature: Vec<u8>,

    /// Unix timestamp at which the attestation was produced
    pub created_at: i64,
}

impl KeyExchangeMessage {
    /// Build and sign an attestation that `owner` holds `owner_key`
    pub fn create(
        signer: &Keypair,
        origin: impl Into<String>,
        owner: impl Into<String>,
        owner_key: &VerifyingKey,
    ) -> Self {
        let mut msg = Self {
            origin: origin.into(),
            owner: owner.into(),
            key_bytes: serialize_key(owner_key),
            signature: vec![],
            created_at: chrono::Utc::now().timestamp(),
        };

        let data = msg.signable_data();
        msg.signature = signer.sign(&data).to_vec();
        msg
    }

    // Canonical digest covering every signed field
    fn signable_data(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.origin.as_bytes());
        hasher.update(self.owner.as_bytes());
        hasher.update(&self.key_bytes);
        hasher.update(self.created_at.to_le_bytes());
        hasher.finalize().to_vec()
    }

    /// Check the signature against the signer's public key
    pub fn verify(&self, signer_key: &VerifyingKey) -> Result<(), KeyError> {
        if self.signature.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidKeyLength {
                expected: SIGNATURE_LENGTH,
                got: self.signature.len(),
            });
        }

        let mut sig_bytes = [0u8; SIGNATURE_LENGTH];
        sig_bytes.copy_from_slice(&self.signature);
        let sig = Signature::from_bytes(&sig_bytes);

        signer_key
            .verify(&self.signable_data(), &sig)
            .map_err(|_| KeyError::InvalidSignature)
    }

    /// Decode the attested key from its wire bytes
    pub fn key(&self) -> Result<VerifyingKey, KeyError> {
        deserialize_key(&self.key_bytes)
    }
}
