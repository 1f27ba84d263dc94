// ring/keyring.rs - Key Ring Façade and Trust Updater

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::VerifyingKey;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::crypto::KeyExchangeMessage;
use crate::reputation::{ReputationOracle, NEUTRAL_REPUTATION};
use crate::snapshot::{EdgeSnapshot, NodeSnapshot, RecordSnapshot, RingSnapshot, RingStats};

use super::graph::{NodeHandle, TrustGraph};
use super::paths::{min_paths_probability, select_best_paths, ShortestPaths};
use super::pending::PendingQueue;
use super::record::{KeyRecord, TrustedKeyRecord};
use super::table::KeyTable;

/// The web-of-trust key ring of the local peer.
///
/// The ring owns a directed signing graph rooted at the local identity, a
/// table of currently believed keys with their confidences, and a queue of
/// attestations that cannot be verified yet. Lookups go through
/// [`KeyRing::get_key`], which refuses keys whose confidence is below the
/// ring's threshold.
///
/// The ring is cheap to clone; clones share state. Lock order is always
/// pending -> graph -> table.
#[derive(Clone, Debug)]
pub struct KeyRing {
    root: String,
    root_handle: NodeHandle,
    threshold: f64,
    graph: Arc<Mutex<TrustGraph>>,
    table: Arc<KeyTable>,
    pending: Arc<Mutex<PendingQueue>>,
    stopped: Arc<AtomicBool>,
}

impl KeyRing {
    /// Create a ring for `owner`, seeded with fully trusted bootstrap
    /// records.
    ///
    /// The owner becomes the root of the signing graph with probability
    /// 1.0 and a record at confidence 1.0. Each bootstrap record gets a
    /// node at probability 1.0, a root->peer edge carrying its key, and a
    /// table entry at its declared confidence. Keys below `threshold` are
    /// withheld from [`KeyRing::get_key`].
    pub fn new(
        owner: impl Into<String>,
        owner_key: VerifyingKey,
        bootstrap: Vec<TrustedKeyRecord>,
        threshold: f64,
    ) -> Self {
        let owner = owner.into();
        let mut graph = TrustGraph::new();
        let root_handle = graph.add_node(&owner, 1.0);

        let table = KeyTable::new();
        table.add(TrustedKeyRecord::new(
            KeyRecord::new(owner.clone(), owner_key),
            1.0,
        ));

        for rec in bootstrap {
            if rec.record.owner == owner {
                warn!(root = %owner, "bootstrap record naming the ring owner skipped");
                continue;
            }
            graph.add_node(&rec.record.owner, 1.0);
            if let Err(e) = graph.add_edge(&owner, &rec.record.owner, rec.record.key) {
                // both endpoints were inserted right above
                panic!("key ring graph corrupted during bootstrap: {e}");
            }
            table.add(rec);
        }

        info!(root = %owner, peers = table.len(), threshold, "key ring created");

        Self {
            root: owner,
            root_handle,
            threshold,
            graph: Arc::new(Mutex::new(graph)),
            table: Arc::new(table),
            pending: Arc::new(Mutex::new(PendingQueue::new())),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Launch the periodic updater without a reputation oracle; unknown
    /// peers get the neutral prior. Must be called within a Tokio runtime;
    /// `rate` must be non-zero.
    pub fn start(&self, rate: Duration) {
        self.spawn_worker(rate, None);
    }

    /// Launch the periodic updater, refreshing per-node trust from the
    /// given oracle each tick.
    pub fn start_with_reputation(&self, rate: Duration, oracle: Arc<dyn ReputationOracle>) {
        self.spawn_worker(rate, Some(oracle));
    }

    /// Ask the updater to exit. The flag is observed at the next tick
    /// boundary; a tick in progress runs to completion. Ring state is
    /// kept, but confidences will no longer refresh.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        info!(root = %self.root, "key ring stop requested");
    }

    /// Key of the named peer, withheld unless its confidence has reached
    /// the ring threshold. Use this when a key is actually about to be
    /// trusted, e.g. to encrypt to a peer.
    pub fn get_key(&self, name: &str) -> Option<VerifyingKey> {
        let rec = self.table.get(name)?;
        if rec.confidence < self.threshold {
            return None;
        }
        Some(rec.record.key)
    }

    /// Full record of the named peer, regardless of threshold. Use this
    /// when inspecting a peer, e.g. while scoring its reputation.
    pub fn get_record(&self, name: &str) -> Option<TrustedKeyRecord> {
        self.table.get(name)
    }

    /// Names the ring holds a record for, the owner included
    pub fn peer_list(&self) -> Vec<String> {
        self.table.peers()
    }

    /// Queue an attestation whose signer's key is not trusted yet. The
    /// message is replayed on every updater tick until its signer becomes
    /// known or the signature is decisively rejected.
    pub fn add_unverified(&self, msg: KeyExchangeMessage) {
        debug!(origin = %msg.origin, owner = %msg.owner, "attestation queued until signer is trusted");
        self.pending.lock().push(msg);
    }

    /// Ingest a verified attestation: `signer` asserts the binding in
    /// `rec`, and `owner_reputation` feeds the owner's new trust
    /// probability.
    ///
    /// Attestations from signers the ring cannot place, and self-signed
    /// attestations, are ignored. On return the confidences already
    /// reflect the new edge.
    pub fn add(&self, rec: KeyRecord, signer: &str, owner_reputation: f64) {
        let mut graph = self.graph.lock();

        if !graph.contains(signer) {
            debug!(signer, owner = %rec.owner, "attestation from unknown signer ignored");
            return;
        }
        if rec.owner == signer {
            debug!(signer, "self-signed attestation ignored");
            return;
        }
        if rec.owner == self.root {
            // the ring's belief in its own key is axiomatic
            debug!(signer, "attestation about the ring owner ignored");
            return;
        }

        let owner = match graph.handle(&rec.owner) {
            Some(h) => h,
            None => graph.add_node(&rec.owner, 0.0),
        };

        if let Err(e) = graph.add_edge(signer, &rec.owner, rec.key) {
            // both endpoints exist and signer != owner was checked
            panic!("key ring graph corrupted: {e}");
        }

        let sp = ShortestPaths::compute(&graph, self.root_handle);
        let probability = phi(&sp, owner, owner_reputation);
        graph.set_probability(owner, probability);

        if self.table.get(&rec.owner).is_none() {
            self.table.add(TrustedKeyRecord::new(rec.clone(), 0.0));
        }

        debug!(signer, owner = %rec.owner, probability, "attestation accepted");

        // recompute before the lock is released, so callers observe a
        // consistent ring once `add` returns
        recompute_confidence(&graph, &self.table, self.root_handle);
    }

    /// Run one maintenance pass: refresh per-node trust, replay pending
    /// attestations, recompute confidences. The background updater calls
    /// this on every tick; embedders and tests may drive it directly.
    pub fn update(&self, oracle: Option<&dyn ReputationOracle>) {
        self.update_trust(oracle);
        self.update_pending(oracle);
        self.update_confidence();
    }

    /// Read-only export of the ring for dumps and visualizers
    pub fn snapshot(&self) -> RingSnapshot {
        let graph = self.graph.lock();

        let nodes = graph
            .handles()
            .map(|h| NodeSnapshot {
                name: graph.name(h).to_owned(),
                probability: graph.probability(h),
            })
            .collect();

        let mut edges: Vec<EdgeSnapshot> = graph
            .edges()
            .map(|(s, t, key)| EdgeSnapshot {
                signer: graph.name(s).to_owned(),
                target: graph.name(t).to_owned(),
                key: hex::encode(key.to_bytes()),
            })
            .collect();
        edges.sort_by(|a, b| (&a.signer, &a.target).cmp(&(&b.signer, &b.target)));
        drop(graph);

        let mut records: Vec<RecordSnapshot> = self
            .table
            .peers()
            .into_iter()
            .filter_map(|name| {
                self.table.get(&name).map(|rec| RecordSnapshot {
                    owner: name,
                    key: hex::encode(rec.record.key.to_bytes()),
                    confidence: rec.confidence,
                })
            })
            .collect();
        records.sort_by(|a, b| a.owner.cmp(&b.owner));

        RingSnapshot {
            root: self.root.clone(),
            threshold: self.threshold,
            nodes,
            edges,
            records,
        }
    }

    /// Current ring sizes
    pub fn stats(&self) -> RingStats {
        let pending = self.pending.lock().len();
        let graph = self.graph.lock();
        RingStats {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            records: self.table.len(),
            pending,
        }
    }

    /// Identity of the ring owner
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Confidence threshold enforced by [`KeyRing::get_key`]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn spawn_worker(&self, rate: Duration, oracle: Option<Arc<dyn ReputationOracle>>) {
        self.stopped.store(false, Ordering::SeqCst);
        let ring = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(rate);
            // the first interval tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if ring.stopped.load(Ordering::SeqCst) {
                    break;
                }
                ring.update(oracle.as_deref());
            }
            debug!(root = %ring.root, "key ring updater exited");
        });
    }

    // Refresh every node's trust probability from the oracle and the
    // current hop distances. The root is pinned at 1.0 and skipped.
    fn update_trust(&self, oracle: Option<&dyn ReputationOracle>) {
        let mut graph = self.graph.lock();
        let sp = ShortestPaths::compute(&graph, self.root_handle);

        let handles: Vec<NodeHandle> = graph.handles().collect();
        for h in handles {
            if h == self.root_handle {
                continue;
            }
            let reputation = oracle
                .and_then(|o| o.reputation(graph.name(h)))
                .unwrap_or(NEUTRAL_REPUTATION);
            let probability = phi(&sp, h, 2.0 * reputation);
            graph.set_probability(h, probability);
        }
    }

    // Replay queued attestations. Messages whose signer is still unknown
    // go back to the queue; applied and decisively rejected ones do not.
    fn update_pending(&self, oracle: Option<&dyn ReputationOracle>) {
        let drained = self.pending.lock().take_all();
        if drained.is_empty() {
            return;
        }

        let mut kept = Vec::new();
        for msg in drained {
            let reputation = oracle
                .and_then(|o| o.reputation(&msg.owner))
                .unwrap_or(NEUTRAL_REPUTATION);
            match self.replay(&msg, 2.0 * reputation) {
                Replay::Applied => {
                    debug!(origin = %msg.origin, owner = %msg.owner, "pending attestation applied")
                }
                Replay::Rejected => {
                    warn!(origin = %msg.origin, owner = %msg.owner, "pending attestation rejected")
                }
                Replay::AwaitingSigner => kept.push(msg),
            }
        }

        if !kept.is_empty() {
            self.pending.lock().restore_front(kept);
        }
    }

    fn replay(&self, msg: &KeyExchangeMessage, owner_reputation: f64) -> Replay {
        let key = match msg.key() {
            Ok(key) => key,
            // malformed key bytes can never verify later
            Err(_) => return Replay::Rejected,
        };

        let Some(signer_key) = self.get_key(&msg.origin) else {
            return Replay::AwaitingSigner;
        };

        match msg.verify(&signer_key) {
            Ok(()) => {
                self.add(
                    KeyRecord::new(msg.owner.clone(), key),
                    &msg.origin,
                    owner_reputation,
                );
                Replay::Applied
            }
            Err(_) => Replay::Rejected,
        }
    }

    fn update_confidence(&self) {
        let graph = self.graph.lock();
        recompute_confidence(&graph, &self.table, self.root_handle);
    }
}

enum Replay {
    Applied,
    Rejected,
    AwaitingSigner,
}

/// Trust put in a node for advertising keys: bounded by 1/dist(root, node)
/// and by the reputation argument. Unreachable nodes get 0; the root's
/// distance of 0 counts as 1.
fn phi(sp: &ShortestPaths, node: NodeHandle, reputation: f64) -> f64 {
    match sp.distance(node) {
        None => 0.0,
        Some(d) => (1.0 / (d.max(1) as f64)).min(reputation),
    }
}

// One confidence pass: for every target except the root, enumerate the
// shortest endorsement paths, keep the ones agreeing on the winning key,
// and commit the resulting confidence to the table.
fn recompute_confidence(graph: &TrustGraph, table: &KeyTable, root: NodeHandle) {
    let sp = ShortestPaths::compute(graph, root);

    for target in graph.handles() {
        if target == root {
            continue;
        }
        let paths = sp.all_paths_to(target);
        let (retained, best_key) = select_best_paths(graph, paths);
        let confidence = min_paths_probability(graph, &retained);
        table.update_confidence(graph.name(target), confidence, best_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::reputation::StaticReputation;

    fn trusted(owner: &str, key: VerifyingKey, confidence: f64) -> TrustedKeyRecord {
        TrustedKeyRecord::new(KeyRecord::new(owner, key), confidence)
    }

    /// Ring for "root" with a single fully wired bootstrap peer "b"
    fn bootstrap_ring(threshold: f64) -> (KeyRing, Keypair) {
        let root = Keypair::generate();
        let b = Keypair::generate();
        let ring = KeyRing::new(
            "root",
            root.public(),
            vec![trusted("b", b.public(), 0.9)],
            threshold,
        );
        (ring, b)
    }

    #[test]
    fn s1_bootstrap_only() {
        let root = Keypair::generate();
        let b = Keypair::generate();
        let ring = KeyRing::new(
            "root",
            root.public(),
            vec![trusted("b", b.public(), 0.9)],
            0.5,
        );

        assert_eq!(ring.get_key("b"), Some(b.public()));
        assert_eq!(ring.get_record("root").unwrap().confidence, 1.0);

        let mut peers = ring.peer_list();
        peers.sort();
        assert_eq!(peers, vec!["b", "root"]);
    }

    #[test]
    fn s2_two_hop_attestation() {
        let (ring, _b) = bootstrap_ring(0.5);
        let c = Keypair::generate();

        ring.add(KeyRecord::new("c", c.public()), "b", 0.5);

        assert_eq!(ring.get_key("c"), Some(c.public()));
        assert_eq!(ring.get_record("c").unwrap().confidence, 1.0);
    }

    #[test]
    fn s3_conflicting_attestations() {
        let root = Keypair::generate();
        let b = Keypair::generate();
        let d = Keypair::generate();
        let ring = KeyRing::new(
            "root",
            root.public(),
            vec![trusted("b", b.public(), 1.0), trusted("d", d.public(), 1.0)],
            0.5,
        );

        let kc = Keypair::generate().public();
        let kc_other = Keypair::generate().public();
        ring.add(KeyRecord::new("c", kc), "b", 0.5);
        ring.add(KeyRecord::new("c", kc_other), "d", 0.5);

        // occurrence tie: the first path observed (through b) wins, and the
        // confidence reflects only that retained path
        assert_eq!(ring.get_key("c"), Some(kc));
        assert_eq!(ring.get_record("c").unwrap().confidence, 1.0);
    }

    #[test]
    fn s4_unknown_signer_is_ignored() {
        let (ring, _b) = bootstrap_ring(0.5);
        let before = ring.stats();

        ring.add(KeyRecord::new("c", Keypair::generate().public()), "ghost", 0.5);

        let after = ring.stats();
        assert_eq!(before.nodes, after.nodes);
        assert_eq!(before.edges, after.edges);
        assert_eq!(before.records, after.records);
        assert!(ring.get_key("c").is_none());
        assert!(ring.get_record("c").is_none());
    }

    #[test]
    fn s5_threshold_gating() {
        let (ring, _b) = bootstrap_ring(0.99);
        let c = Keypair::generate();
        ring.add(KeyRecord::new("c", c.public()), "b", 0.5);

        // reputation 0.45 caps b's probability at 0.9, so the two-hop
        // confidence lands below the 0.99 threshold
        let mut oracle = StaticReputation::new();
        oracle.set("b", 0.45);
        ring.update(Some(&oracle));

        assert!(ring.get_key("c").is_none());
        let confidence = ring.get_record("c").unwrap().confidence;
        assert!((confidence - 0.9).abs() < 1e-9);

        // b itself is a direct neighbor and stays above threshold
        assert!(ring.get_key("b").is_some());
    }

    #[test]
    fn s6_pending_replay() {
        let root = Keypair::generate();
        let ring = KeyRing::new("root", root.public(), vec![], 0.5);

        let x = Keypair::generate();
        let y = Keypair::generate();
        let msg = KeyExchangeMessage::create(&x, "x", "y", &y.public());
        ring.add_unverified(msg);

        assert!(ring.get_key("y").is_none());
        assert_eq!(ring.stats().pending, 1);

        // x becomes known with sufficient confidence
        ring.add(KeyRecord::new("x", x.public()), "root", 1.0);
        ring.update(None);

        assert_eq!(ring.get_key("y"), Some(y.public()));
        assert_eq!(ring.stats().pending, 0);
    }

    #[test]
    fn pending_kept_while_signer_unknown() {
        let root = Keypair::generate();
        let ring = KeyRing::new("root", root.public(), vec![], 0.5);

        let x = Keypair::generate();
        let y = Keypair::generate();
        ring.add_unverified(KeyExchangeMessage::create(&x, "x", "y", &y.public()));

        ring.update(None);
        ring.update(None);

        assert_eq!(ring.stats().pending, 1);
        assert!(ring.get_key("y").is_none());
    }

    #[test]
    fn pending_bad_signature_is_decisively_dropped() {
        let (ring, _b) = bootstrap_ring(0.5);

        // forged: claims origin "b" but signed by someone else
        let forger = Keypair::generate();
        let y = Keypair::generate();
        ring.add_unverified(KeyExchangeMessage::create(&forger, "b", "y", &y.public()));

        ring.update(None);

        assert_eq!(ring.stats().pending, 0);
        assert!(ring.get_record("y").is_none());
    }

    #[test]
    fn pending_malformed_key_is_decisively_dropped() {
        let (ring, b) = bootstrap_ring(0.5);

        let y = Keypair::generate();
        let mut msg = KeyExchangeMessage::create(&b, "b", "y", &y.public());
        msg.key_bytes.truncate(5);
        ring.add_unverified(msg);

        ring.update(None);

        assert_eq!(ring.stats().pending, 0);
        assert!(ring.get_record("y").is_none());
    }

    #[test]
    fn self_attestation_is_ignored() {
        let (ring, _b) = bootstrap_ring(0.5);
        let before = ring.stats();

        ring.add(KeyRecord::new("b", Keypair::generate().public()), "b", 0.5);

        let after = ring.stats();
        assert_eq!(before.edges, after.edges);
        assert_eq!(before.nodes, after.nodes);
    }

    #[test]
    fn attestation_about_the_owner_is_ignored() {
        let (ring, _b) = bootstrap_ring(0.5);
        let before = ring.stats();

        ring.add(KeyRecord::new("root", Keypair::generate().public()), "b", 1.0);

        assert_eq!(ring.stats().edges, before.edges);
        assert_eq!(ring.get_record("root").unwrap().confidence, 1.0);
        let snapshot = ring.snapshot();
        let root_node = snapshot.nodes.iter().find(|n| n.name == "root").unwrap();
        assert_eq!(root_node.probability, 1.0);
    }

    #[test]
    fn later_attestation_replaces_edge_key() {
        let (ring, _b) = bootstrap_ring(0.5);
        let k1 = Keypair::generate().public();
        let k2 = Keypair::generate().public();

        ring.add(KeyRecord::new("c", k1), "b", 0.5);
        ring.add(KeyRecord::new("c", k2), "b", 0.5);

        assert_eq!(ring.get_key("c"), Some(k2));
        assert_eq!(ring.stats().edges, 2);
    }

    #[test]
    fn root_record_stays_fully_trusted() {
        let (ring, _b) = bootstrap_ring(0.5);

        // hostile oracle scoring everyone, the root included, at zero
        let mut oracle = StaticReputation::new();
        oracle.set("root", 0.0);
        oracle.set("b", 0.0);
        ring.update(Some(&oracle));
        ring.update(Some(&oracle));

        assert_eq!(ring.get_record("root").unwrap().confidence, 1.0);
        let snapshot = ring.snapshot();
        let root_node = snapshot.nodes.iter().find(|n| n.name == "root").unwrap();
        assert_eq!(root_node.probability, 1.0);
    }

    #[test]
    fn confidences_stay_in_unit_interval() {
        let root = Keypair::generate();
        let peers: Vec<Keypair> = (0..4).map(|_| Keypair::generate()).collect();
        let ring = KeyRing::new(
            "root",
            root.public(),
            vec![
                trusted("p0", peers[0].public(), 1.0),
                trusted("p1", peers[1].public(), 1.0),
            ],
            0.5,
        );

        ring.add(KeyRecord::new("p2", peers[2].public()), "p0", 0.8);
        ring.add(KeyRecord::new("p2", peers[2].public()), "p1", 0.8);
        ring.add(KeyRecord::new("p3", peers[3].public()), "p2", 0.3);
        ring.update(None);

        for name in ring.peer_list() {
            let confidence = ring.get_record(&name).unwrap().confidence;
            assert!((0.0..=1.0).contains(&confidence), "{name}: {confidence}");
        }
    }

    #[test]
    fn corroborating_paths_raise_confidence() {
        let root = Keypair::generate();
        let b = Keypair::generate();
        let d = Keypair::generate();
        let ring = KeyRing::new(
            "root",
            root.public(),
            vec![trusted("b", b.public(), 1.0), trusted("d", d.public(), 1.0)],
            0.5,
        );

        // both depth-1 peers assert the same key for c
        let kc = Keypair::generate().public();
        ring.add(KeyRecord::new("c", kc), "b", 0.5);
        ring.add(KeyRecord::new("c", kc), "d", 0.5);

        // cap both internal nodes at 0.5: 1 - (1 - 0.5)^2
        let mut oracle = StaticReputation::new();
        oracle.set("b", 0.25);
        oracle.set("d", 0.25);
        ring.update(Some(&oracle));

        let confidence = ring.get_record("c").unwrap().confidence;
        assert!((confidence - 0.75).abs() < 1e-9);
        assert_eq!(ring.get_key("c"), Some(kc));
    }

    #[test]
    fn update_is_idempotent_on_frozen_ring() {
        let (ring, _b) = bootstrap_ring(0.5);
        ring.add(KeyRecord::new("c", Keypair::generate().public()), "b", 0.5);

        ring.update(None);
        let first = ring.snapshot();
        ring.update(None);
        let second = ring.snapshot();

        assert_eq!(first.records, second.records);
        assert_eq!(first.nodes, second.nodes);
    }

    #[test]
    fn disconnected_target_confidence_drops_to_zero() {
        let (ring, _b) = bootstrap_ring(0.5);

        // a record for a node nothing signs for
        let lone = Keypair::generate();
        ring.graph.lock().add_node("lone", 0.5);
        ring.table
            .add(trusted("lone", lone.public(), 0.9));

        ring.update(None);

        let rec = ring.get_record("lone").unwrap();
        assert_eq!(rec.confidence, 0.0);
        // the stored key is left in place but withheld by the threshold
        assert_eq!(rec.record.key, lone.public());
        assert!(ring.get_key("lone").is_none());
    }

    #[tokio::test]
    async fn background_updater_resolves_pending() {
        let root = Keypair::generate();
        let ring = KeyRing::new("root", root.public(), vec![], 0.5);

        let x = Keypair::generate();
        let y = Keypair::generate();
        ring.add_unverified(KeyExchangeMessage::create(&x, "x", "y", &y.public()));
        ring.add(KeyRecord::new("x", x.public()), "root", 1.0);

        ring.start(Duration::from_millis(10));

        let mut resolved = false;
        for _ in 0..200 {
            if ring.get_key("y").is_some() {
                resolved = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        ring.stop();

        assert!(resolved, "pending attestation was not replayed by the updater");
        assert_eq!(ring.get_key("y"), Some(y.public()));
    }
}
