//! Typed data-access facade over an embedded SQLite object store.
//!
//! `shelve` wraps the embedded engine behind a small generic surface: fetch,
//! upsert, and delete whole collections of serde-serializable records, with
//! a four-kind error taxonomy and conditional debug logging. All storage,
//! indexing, and transaction work is delegated to the engine; this crate
//! only forwards calls and translates errors.

pub mod config;
pub mod db;
pub mod debug;
pub mod logging;
pub mod record;
pub mod store;

pub use config::{DebugLevel, StoreConfig};
pub use debug::{DebugSink, MemorySink, StdoutSink};
pub use logging::{default_log_level, init_logging, logging_status};
pub use record::Record;
pub use store::{Store, StoreError, StoreLocation, StoreResult};

/// Returns the crate version.
pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::crate_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!crate_version().is_empty());
    }
}
