// lib.rs - Web-of-Trust Key Ring for Authenticated Gossip

//! Peers of a gossip cohort exchange signed key attestations; this crate
//! turns them into a directed trust graph rooted at the local peer and
//! answers name -> public key lookups with a continuously recomputed
//! confidence.
//!
//! The entry point is [`KeyRing`]: construct it from bootstrap trusted
//! records, feed it attestations via [`KeyRing::add`] (verified) or
//! [`KeyRing::add_unverified`] (signer not yet trusted), and look keys up
//! with [`KeyRing::get_key`], which withholds any key whose confidence is
//! below the ring's threshold. A background updater refreshes per-node
//! trust from a pluggable [`ReputationOracle`], replays pending
//! attestations and recomputes confidences from shortest endorsement
//! paths.

pub mod crypto;
pub mod reputation;
pub mod ring;
pub mod snapshot;

// Re-export commonly used types
pub use crypto::{deserialize_key, fingerprint, serialize_key, KeyError, KeyExchangeMessage, Keypair};

pub use reputation::{ReputationOracle, StaticReputation, NEUTRAL_REPUTATION};

pub use ring::{
    GraphError, KeyRecord, KeyRing, KeyTable, NodeHandle, PendingQueue, TrustGraph,
    TrustedKeyRecord,
};

pub use snapshot::{EdgeSnapshot, NodeSnapshot, RecordSnapshot, RingSnapshot, RingStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
