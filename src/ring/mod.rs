// ring/mod.rs - Web-of-Trust Key Ring

//! The trust graph and its confidence-propagation engine.
//!
//! Peers gossip signed bindings of the form "signer S attests that
//! identity O owns public key K". This module assembles those attestations
//! into a directed graph rooted at the local peer and keeps, for every
//! known identity, the one key the ring currently believes in together
//! with a confidence in `[0, 1]`:
//!
//! - **Records**: identity/key bindings and their believed confidence
//! - **KeyTable**: the confidence-gated name -> key mapping
//! - **TrustGraph**: the signing graph, probabilities on nodes, asserted
//!   keys on edges
//! - **PendingQueue**: attestations parked until their signer is trusted
//! - **KeyRing**: the façade, with its periodic trust updater
//!
//! Confidence is recomputed from the set of shortest endorsement paths:
//! conflicting keys are resolved per target by majority among
//! equally-short paths, and the retained paths combine as a disjunction of
//! independent chains.
//!
//! # Example
//!
//! ```ignore
//! use wot_keyring::{KeyRing, KeyRecord, TrustedKeyRecord, Keypair};
//!
//! let me = Keypair::generate();
//! let friend = Keypair::generate();
//!
//! let ring = KeyRing::new(
//!     "me",
//!     me.public(),
//!     vec![TrustedKeyRecord::new(KeyRecord::new("friend", friend.public()), 1.0)],
//!     0.5,
//! );
//! ring.start(std::time::Duration::from_secs(5));
//!
//! // a verified attestation: friend vouches for carol's key
//! let carol = Keypair::generate();
//! ring.add(KeyRecord::new("carol", carol.public()), "friend", 0.5);
//! assert!(ring.get_key("carol").is_some());
//! ```

mod graph;
mod keyring;
mod paths;
mod pending;
mod record;
mod table;

pub use graph::{GraphError, NodeHandle, TrustGraph};
pub use keyring::KeyRing;
pub use pending::PendingQueue;
pub use record::{KeyRecord, TrustedKeyRecord};
pub use table::KeyTable;
