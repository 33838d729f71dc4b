//! Storable record capability.
//!
//! # Responsibility
//! - Define the contract a caller type must satisfy to live in the store.
//!
//! # Invariants
//! - `COLLECTION` is a stable type tag; changing it orphans persisted rows.
//! - `key()` is the record's identity; upserts overwrite rows sharing it.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Capability bound for any caller-supplied type persisted by the store.
///
/// The facade imposes no shape beyond this: a stable collection tag, a stable
/// per-record identity, and serde round-trip support. The record body is
/// stored as JSON text, so identity fields are duplicated into the body and
/// survive round-trips unchanged.
pub trait Record: Serialize + DeserializeOwned {
    /// Stable name of the collection this type is stored under.
    ///
    /// Distinct record types must use distinct collection names unless they
    /// deliberately share one storage shape.
    const COLLECTION: &'static str;

    /// Stable primary identity for this record.
    ///
    /// Saving two records with the same key leaves only the latest one.
    fn key(&self) -> String;
}
