// ring/record.rs - Key Records

use ed25519_dalek::VerifyingKey;

use crate::crypto::fingerprint;

/// A binding between a peer identity and a public key, as asserted by some
/// signer. Carries no confidence of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRecord {
    /// Identity the key is claimed to belong to
    pub owner: String,

    /// The asserted public key
    pub key: VerifyingKey,
}

impl KeyRecord {
    /// Create a record binding `owner` to `key`
    pub fn new(owner: impl Into<String>, key: VerifyingKey) -> Self {
        Self {
            owner: owner.into(),
            key,
        }
    }
}

/// A key record together with the ring's current belief that the binding is
/// correct, in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TrustedKeyRecord {
    /// The identity/key binding
    pub record: KeyRecord,

    /// Confidence that the stored key really belongs to the owner
    pub confidence: f64,
}

impl TrustedKeyRecord {
    /// Create a trusted record with the given confidence
    pub fn new(record: KeyRecord, confidence: f64) -> Self {
        Self { record, confidence }
    }

    /// Owner identity of the record
    pub fn owner(&self) -> &str {
        &self.record.owner
    }

    /// Short key fingerprint, for log lines
    pub fn key_fingerprint(&self) -> String {
        fingerprint(&self.record.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn test_record_accessors() {
        let kp = Keypair::generate();
        let rec = TrustedKeyRecord::new(KeyRecord::new("node1", kp.public()), 0.7);

        assert_eq!(rec.owner(), "node1");
        assert_eq!(rec.confidence, 0.7);
        assert_eq!(rec.key_fingerprint().len(), 16);
    }
}
