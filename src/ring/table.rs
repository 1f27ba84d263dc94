// ring/table.rs - Trusted Key Table

use std::collections::HashMap;

use ed25519_dalek::VerifyingKey;
use parking_lot::Mutex;
use tracing::trace;

use super::record::TrustedKeyRecord;

/// Identity -> trusted record mapping.
///
/// All operations are serialized by a single internal mutex, so callers
/// never observe partial state. The table is a leaf in the ring's lock
/// order: its methods take no other lock.
#[derive(Debug, Default)]
pub struct KeyTable {
    records: Mutex<HashMap<String, TrustedKeyRecord>>,
}

impl KeyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record. On replacement the confidence carried by
    /// `rec` is authoritative.
    pub fn add(&self, rec: TrustedKeyRecord) {
        let mut records = self.records.lock();
        records.insert(rec.record.owner.clone(), rec);
    }

    /// Look up the record for `name`
    pub fn get(&self, name: &str) -> Option<TrustedKeyRecord> {
        self.records.lock().get(name).cloned()
    }

    /// Replace the stored key and confidence for `name`.
    ///
    /// With `Some(key)` the stored key becomes `key` and the confidence
    /// becomes `confidence`. With `None` (target unreachable from the root)
    /// the confidence is forced to 0 and the stored key is left in place.
    /// Unknown names are a no-op.
    pub fn update_confidence(&self, name: &str, confidence: f64, key: Option<VerifyingKey>) {
        let mut records = self.records.lock();
        let Some(entry) = records.get_mut(name) else {
            return;
        };
        match key {
            Some(key) => {
                entry.record.key = key;
                entry.confidence = confidence;
            }
            None => {
                entry.confidence = 0.0;
            }
        }
        trace!(name, confidence = entry.confidence, "confidence committed");
    }

    /// Snapshot of the identities currently known to the table
    pub fn peers(&self) -> Vec<String> {
        self.records.lock().keys().cloned().collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when no record is stored
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
