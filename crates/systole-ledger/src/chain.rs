//! The hash chain itself
//!
//! Entries live in an append-only arena indexed by position. The chain
//! invariant is structural: `entry[i].index == i`,
//! `entry[i].previous_hash == entry[i-1].hash`, and every stored hash
//! matches a recomputation over the entry's own fields. Appends are
//! serialized under a single write lock so the index stays monotonic and
//! the linkage correct even with concurrent callers.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use systole_common::crypto::canonical::to_canonical_value;
use systole_common::crypto::merkle::{hash_leaf, merkle_root};
use systole_common::{OrganismError, Result};

use crate::payload::{LedgerPayload, GENESIS_MESSAGE};

/// Sentinel previous-hash of the genesis entry: 64 zero hex chars
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A single immutable entry in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the chain, starting at 0 for genesis
    pub index: u64,
    /// Append time (Unix milliseconds)
    pub timestamp_ms: i64,
    /// Canonicalized payload
    pub payload: Value,
    /// Hex digest of the previous entry, or the genesis sentinel
    pub previous_hash: String,
    /// Hex digest over index, timestamp, canonical payload, and previous hash
    pub hash: String,
}

/// Read surface handed to external auditors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerManifest {
    /// Number of entries including genesis
    pub chain_length: u64,
    /// Merkle root over all entry hashes
    pub merkle_root: String,
    /// Hash of the genesis entry
    pub genesis_hash: String,
    /// Hash of the newest entry
    pub latest_hash: String,
}

/// Append-only hash-chained ledger
pub struct ImmutableLedger {
    chain: RwLock<Vec<LedgerEntry>>,
}

/// Digest over index, timestamp, canonical payload, and previous hash
fn entry_hash(index: u64, timestamp_ms: i64, payload: &Value, previous_hash: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(timestamp_ms.to_string().as_bytes());
    hasher.update(payload.to_string().as_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.finalize().to_hex().to_string()
}

impl ImmutableLedger {
    /// Create a ledger with its genesis entry
    pub fn new() -> Self {
        let ledger = Self {
            chain: RwLock::new(Vec::new()),
        };
        // Built literally so construction is infallible; the payload module
        // tests pin this shape to LedgerPayload::genesis()
        let genesis = serde_json::json!({
            "type": "genesis",
            "data": {
                "message": GENESIS_MESSAGE,
                "version": systole_common::VERSION,
            }
        });
        ledger.append_value(genesis);
        ledger
    }

    /// Append a typed payload; the only mutation the ledger supports
    #[instrument(skip(self, payload))]
    pub fn append(&self, payload: &LedgerPayload) -> Result<LedgerEntry> {
        let value = to_canonical_value(payload)?;
        Ok(self.append_value(value))
    }

    fn append_value(&self, payload: Value) -> LedgerEntry {
        let mut chain = self.chain.write();

        let index = chain.len() as u64;
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let previous_hash = chain
            .last()
            .map(|entry| entry.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());
        let hash = entry_hash(index, timestamp_ms, &payload, &previous_hash);

        let entry = LedgerEntry {
            index,
            timestamp_ms,
            payload,
            previous_hash,
            hash,
        };
        chain.push(entry.clone());
        debug!(index, "ledger entry appended");
        entry
    }

    /// Walk the full chain from genesis, recomputing every hash and
    /// checking linkage; any mismatch is a chain-integrity failure
    pub fn verify(&self) -> bool {
        self.audit().is_ok()
    }

    /// Like [`verify`](Self::verify) but reporting where the chain broke
    pub fn audit(&self) -> Result<()> {
        let chain = self.chain.read();

        for (position, entry) in chain.iter().enumerate() {
            let index = position as u64;
            if entry.index != index {
                return Err(OrganismError::ChainIntegrity {
                    index,
                    reason: format!("index {} out of sequence", entry.index),
                });
            }

            let expected_previous = if position == 0 {
                GENESIS_PREVIOUS_HASH
            } else {
                chain[position - 1].hash.as_str()
            };
            if entry.previous_hash != expected_previous {
                return Err(OrganismError::ChainIntegrity {
                    index,
                    reason: "previous-hash linkage broken".to_string(),
                });
            }

            let recomputed = entry_hash(
                entry.index,
                entry.timestamp_ms,
                &entry.payload,
                &entry.previous_hash,
            );
            if recomputed != entry.hash {
                return Err(OrganismError::ChainIntegrity {
                    index,
                    reason: "stored hash does not match recomputation".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Recheck a single entry in isolation: stored hash vs recomputation
    pub fn verify_entry(&self, index: u64) -> bool {
        let chain = self.chain.read();
        match chain.get(index as usize) {
            Some(entry) => {
                entry.index == index
                    && entry_hash(
                        entry.index,
                        entry.timestamp_ms,
                        &entry.payload,
                        &entry.previous_hash,
                    ) == entry.hash
            }
            None => false,
        }
    }

    /// Merkle root over all entry hashes
    ///
    /// Leaves are blake3 digests of the hex hash strings; odd levels pad
    /// by duplicating the last node.
    pub fn merkle_root(&self) -> String {
        let chain = self.chain.read();
        let leaves: Vec<_> = chain
            .iter()
            .map(|entry| hash_leaf(entry.hash.as_bytes()))
            .collect();
        match merkle_root(&leaves) {
            // The chain always holds at least the genesis entry
            Some(root) => blake3::Hash::from(root).to_hex().to_string(),
            None => String::new(),
        }
    }

    /// Manifest for external auditors: length, root, endpoints
    pub fn manifest(&self) -> LedgerManifest {
        let merkle_root = self.merkle_root();
        let chain = self.chain.read();
        LedgerManifest {
            chain_length: chain.len() as u64,
            merkle_root,
            genesis_hash: chain.first().map(|e| e.hash.clone()).unwrap_or_default(),
            latest_hash: chain.last().map(|e| e.hash.clone()).unwrap_or_default(),
        }
    }

    /// Number of entries including genesis
    pub fn len(&self) -> u64 {
        self.chain.read().len() as u64
    }

    /// A ledger is never empty; the genesis entry exists from construction
    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Clone of the entry at the given index
    pub fn entry(&self, index: u64) -> Option<LedgerEntry> {
        self.chain.read().get(index as usize).cloned()
    }

    /// Clone of the newest entry
    pub fn latest(&self) -> Option<LedgerEntry> {
        self.chain.read().last().cloned()
    }

    /// Clones of entries in `[start, end)`; `None` end means to the tip
    pub fn entries(&self, start: u64, end: Option<u64>) -> Vec<LedgerEntry> {
        let chain = self.chain.read();
        let start = start as usize;
        let end = end.map(|e| e as usize).unwrap_or(chain.len()).min(chain.len());
        if start >= end {
            return Vec::new();
        }
        chain[start..end].to_vec()
    }
}

impl Default for ImmutableLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use systole_common::crypto::canonical::to_canonical_string;
    use systole_common::{Action, ActionRecord, DecisionVector, Pulse};

    fn sample_pulse(sequence: u64) -> LedgerPayload {
        LedgerPayload::Pulse {
            pulse: Pulse {
                k: 4,
                p: 5,
                t1: 0.001,
                sequence,
                value: 0.004211,
                stable: true,
            },
        }
    }

    #[test]
    fn test_genesis_created_at_construction() {
        let ledger = ImmutableLedger::new();
        assert_eq!(ledger.len(), 1);
        let genesis = ledger.entry(0).unwrap();
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(ledger.verify());
    }

    #[test]
    fn test_genesis_literal_matches_typed_payload() {
        let ledger = ImmutableLedger::new();
        let stored = ledger.entry(0).unwrap().payload.to_string();
        let typed = to_canonical_string(&LedgerPayload::genesis()).unwrap();
        assert_eq!(stored, typed);
    }

    #[test]
    fn test_append_links_to_previous() {
        let ledger = ImmutableLedger::new();
        let first = ledger.append(&sample_pulse(1)).unwrap();
        let second = ledger.append(&sample_pulse(2)).unwrap();

        assert_eq!(first.index, 1);
        assert_eq!(second.index, 2);
        assert_eq!(second.previous_hash, first.hash);
        assert!(ledger.verify());
    }

    #[test]
    fn test_verify_is_idempotent() {
        let ledger = ImmutableLedger::new();
        for sequence in 1..=5 {
            ledger.append(&sample_pulse(sequence)).unwrap();
        }
        assert!(ledger.verify());
        assert!(ledger.verify());
    }

    #[test]
    fn test_tampered_payload_breaks_chain_from_that_entry() {
        let ledger = ImmutableLedger::new();
        for sequence in 1..=4 {
            ledger.append(&sample_pulse(sequence)).unwrap();
        }
        assert!(ledger.verify());

        // Flip a value inside entry 2's stored payload
        {
            let mut chain = ledger.chain.write();
            chain[2].payload["data"]["pulse"]["sequence"] = serde_json::json!(999);
        }

        assert!(!ledger.verify());
        match ledger.audit() {
            Err(OrganismError::ChainIntegrity { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected chain integrity failure, got {other:?}"),
        }

        // Earlier entries still verify individually
        assert!(ledger.verify_entry(0));
        assert!(ledger.verify_entry(1));
        assert!(!ledger.verify_entry(2));
    }

    #[test]
    fn test_tampered_hash_detected() {
        let ledger = ImmutableLedger::new();
        ledger.append(&sample_pulse(1)).unwrap();
        ledger.append(&sample_pulse(2)).unwrap();

        {
            let mut chain = ledger.chain.write();
            let tampered = format!("{}0", &chain[1].hash[1..]);
            chain[1].hash = tampered;
        }

        assert!(!ledger.verify());
        assert!(!ledger.verify_entry(1));
    }

    #[test]
    fn test_merkle_root_stable_across_reads() {
        let ledger = ImmutableLedger::new();
        for sequence in 1..=3 {
            ledger.append(&sample_pulse(sequence)).unwrap();
        }

        let before = ledger.merkle_root();
        let _ = ledger.manifest();
        let _ = ledger.entries(0, None);
        assert!(ledger.verify());
        assert_eq!(ledger.merkle_root(), before);
    }

    #[test]
    fn test_merkle_root_changes_on_append() {
        let ledger = ImmutableLedger::new();
        let before = ledger.merkle_root();
        ledger.append(&sample_pulse(1)).unwrap();
        assert_ne!(ledger.merkle_root(), before);
    }

    #[test]
    fn test_manifest_endpoints() {
        let ledger = ImmutableLedger::new();
        let tip = ledger
            .append(&LedgerPayload::Action {
                record: ActionRecord {
                    action: Action::Noop,
                    decision: DecisionVector::default(),
                },
            })
            .unwrap();

        let manifest = ledger.manifest();
        assert_eq!(manifest.chain_length, 2);
        assert_eq!(manifest.latest_hash, tip.hash);
        assert_eq!(manifest.genesis_hash, ledger.entry(0).unwrap().hash);
        assert!(!manifest.merkle_root.is_empty());
    }

    #[test]
    fn test_entries_range() {
        let ledger = ImmutableLedger::new();
        for sequence in 1..=4 {
            ledger.append(&sample_pulse(sequence)).unwrap();
        }
        assert_eq!(ledger.entries(1, Some(3)).len(), 2);
        assert_eq!(ledger.entries(0, None).len(), 5);
        assert!(ledger.entries(4, Some(2)).is_empty());
    }
}
