// snapshot.rs - Read-Only Ring Export

//! Serializable view of a key ring for dumps and external visualizers.
//!
//! The export is one-way: it carries node probabilities, signing edges and
//! trusted records with keys hex-encoded, in a deterministic order, and is
//! never read back into a ring.

use serde::{Deserialize, Serialize};

/// A node of the signing graph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Peer identity
    pub name: String,

    /// Trust probability at export time
    pub probability: f64,
}

/// A signing edge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    /// Identity that signed
    pub signer: String,

    /// Identity whose key was signed
    pub target: String,

    /// Hex encoding of the asserted public key
    pub key: String,
}

/// A trusted record of the key table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    /// Peer identity
    pub owner: String,

    /// Hex encoding of the currently believed key
    pub key: String,

    /// Confidence in the binding at export time
    pub confidence: f64,
}

/// Full ring export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingSnapshot {
    /// Identity of the ring owner
    pub root: String,

    /// Confidence threshold enforced on lookups
    pub threshold: f64,

    /// Graph nodes, in insertion order
    pub nodes: Vec<NodeSnapshot>,

    /// Signing edges, sorted by (signer, target)
    pub edges: Vec<EdgeSnapshot>,

    /// Table records, sorted by owner
    pub records: Vec<RecordSnapshot>,
}

/// Ring size counters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingStats {
    /// Nodes in the signing graph
    pub nodes: usize,

    /// Edges in the signing graph
    pub edges: usize,

    /// Records in the key table
    pub records: usize,

    /// Attestations waiting for their signer
    pub pending: usize,
}
