//! Hashing primitives for ledger integrity

pub mod canonical;
pub mod merkle;
