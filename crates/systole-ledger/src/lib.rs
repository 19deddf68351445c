//! # Systole Ledger
//!
//! Append-only, hash-chained record of every beat: pulses, flow results,
//! and actions. Each entry's digest covers its index, timestamp, canonical
//! payload, and the previous entry's digest, so any after-the-fact edit
//! breaks the chain from that entry onward. A Merkle root over the entry
//! digests gives external auditors a single value to compare without
//! re-walking the chain.
//!
//! Append is the only mutation. External collaborators (signers,
//! observability) read entries and the [`LedgerManifest`] but never write.

pub mod chain;
pub mod payload;

pub use chain::{ImmutableLedger, LedgerEntry, LedgerManifest, GENESIS_PREVIOUS_HASH};
pub use payload::LedgerPayload;
