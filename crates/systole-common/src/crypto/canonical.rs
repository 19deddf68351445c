//! Canonical JSON serialization
//!
//! Ledger entry hashing requires that identical logical content always
//! produces identical bytes. Serialization here goes through
//! `serde_json::Value`, whose object representation is a `BTreeMap` (the
//! `preserve_order` feature is deliberately not enabled anywhere in the
//! workspace), so object keys come out sorted and without incidental
//! whitespace. Floats render via serde_json's shortest round-trip form,
//! which is stable for a given bit pattern.

use serde::Serialize;

use crate::error::Result;

/// Serialize a value to its canonical JSON string
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(value.to_string())
}

/// Serialize a value to a canonical `serde_json::Value`
pub fn to_canonical_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
