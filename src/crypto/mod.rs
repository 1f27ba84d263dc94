// crypto/mod.rs - Ring Cryptography

//! Ed25519 keys and signed key exchange messages.
//!
//! The ring only reasons about public keys; this module supplies the thin
//! layer it needs around them: wire (de)serialization, signature checks on
//! attestations, and the local peer's signing pair for producing
//! attestations of its own.

mod exchange;
mod keys;

pub use exchange::KeyExchangeMessage;
pub use keys::{deserialize_key, fingerprint, serialize_key, KeyError, Keypair};
