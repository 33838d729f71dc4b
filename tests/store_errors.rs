use serde::ser::{Error as _, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use shelve::{
    DebugLevel, MemorySink, Record, Store, StoreConfig, StoreError, StoreLocation, StdoutSink,
};
use std::error::Error;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Movie {
    id: String,
    title: String,
}

impl Record for Movie {
    const COLLECTION: &'static str = "movies";

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Record whose serialization can be made to fail on demand, to exercise
/// mid-transaction write failures.
#[derive(Debug, Clone, Deserialize)]
struct Fused {
    id: String,
    blown: bool,
}

impl Serialize for Fused {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.blown {
            return Err(S::Error::custom("fuse blown"));
        }
        let mut state = serializer.serialize_struct("Fused", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("blown", &self.blown)?;
        state.end()
    }
}

impl Record for Fused {
    const COLLECTION: &'static str = "fuses";

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Shape that deliberately does not match `Movie` bodies while sharing the
/// same collection, to exercise decode failures inside a delete transaction.
#[derive(Debug, Serialize, Deserialize)]
struct MovieDecoy {
    id: String,
    runtime_minutes: u32,
}

impl Record for MovieDecoy {
    const COLLECTION: &'static str = "movies";

    fn key(&self) -> String {
        self.id.clone()
    }
}

fn movie(id: &str, title: &str) -> Movie {
    Movie {
        id: id.to_string(),
        title: title.to_string(),
    }
}

#[test]
fn operations_on_uninitialized_store_return_unavailable() {
    let mut store = Store::new(
        StoreLocation::Memory,
        StoreConfig::default(),
        Box::new(StdoutSink),
    );
    assert!(!store.is_ready());

    assert!(matches!(
        store.fetch_all::<Movie>(),
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.fetch_filtered(|_: &Movie| true),
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.save([&movie("a", "Alien")]),
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.delete_all::<Movie>(),
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.delete_filtered(|_: &Movie| true),
        Err(StoreError::Unavailable)
    ));
}

#[test]
fn unavailable_is_reported_on_the_error_debug_channel() {
    let sink = Arc::new(MemorySink::new());
    let store = Store::new(
        StoreLocation::Memory,
        StoreConfig {
            debug: DebugLevel::ErrorOnly,
        },
        Box::new(Arc::clone(&sink)),
    );

    let err = store.fetch_all::<Movie>().unwrap_err();
    assert!(matches!(err, StoreError::Unavailable));

    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Database Error"));
    assert!(lines[0].contains("not available"));
}

#[test]
fn open_with_unreachable_path_starts_uninitialized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("store.db");

    let store = Store::open(
        StoreLocation::File(path),
        StoreConfig::default(),
        Box::new(StdoutSink),
    );
    assert!(!store.is_ready());
}

#[test]
fn reset_reattempts_handle_acquisition() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    let path = nested.join("store.db");

    let mut store = Store::open(
        StoreLocation::File(path),
        StoreConfig::default(),
        Box::new(StdoutSink),
    );
    assert!(!store.is_ready());
    assert!(matches!(
        store.fetch_all::<Movie>(),
        Err(StoreError::Unavailable)
    ));

    std::fs::create_dir_all(&nested).unwrap();
    store.reset();
    assert!(store.is_ready());

    store.save([&movie("a", "Alien")]).unwrap();
    assert_eq!(store.fetch_all::<Movie>().unwrap().len(), 1);
}

#[test]
fn file_store_data_survives_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let mut store = Store::open(
        StoreLocation::File(path),
        StoreConfig::default(),
        Box::new(StdoutSink),
    );
    store.save([&movie("a", "Alien")]).unwrap();

    store.reset();
    assert!(store.is_ready());

    let loaded: Vec<Movie> = store.fetch_all().unwrap();
    assert_eq!(loaded, vec![movie("a", "Alien")]);
}

#[test]
fn failed_save_transaction_persists_nothing() {
    let mut store = Store::open(
        StoreLocation::Memory,
        StoreConfig::default(),
        Box::new(StdoutSink),
    );

    let records = vec![
        Fused {
            id: "a".to_string(),
            blown: false,
        },
        Fused {
            id: "b".to_string(),
            blown: true,
        },
        Fused {
            id: "c".to_string(),
            blown: false,
        },
    ];
    let err = store.save(&records).unwrap_err();
    assert!(matches!(err, StoreError::SaveFailed(_)));
    // The underlying cause is preserved, not swallowed.
    assert!(err.source().is_some());

    let loaded: Vec<Fused> = store.fetch_all().unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn failed_delete_transaction_removes_nothing() {
    let sink = Arc::new(MemorySink::new());
    let mut store = Store::open(
        StoreLocation::Memory,
        StoreConfig {
            debug: DebugLevel::ErrorOnly,
        },
        Box::new(Arc::clone(&sink)),
    );

    let movies = vec![movie("a", "Alien"), movie("b", "Heat")];
    store.save(&movies).unwrap();

    // Decoy shape cannot decode the stored bodies, so the transaction
    // aborts before any row is deleted.
    let err = store
        .delete_filtered(|_: &MovieDecoy| true)
        .unwrap_err();
    assert!(matches!(err, StoreError::DeleteFailed(_)));
    assert!(err.source().is_some());
    assert!(sink.lines().iter().any(|line| line.contains("Database Error")));

    let remaining: Vec<Movie> = store.fetch_all().unwrap();
    assert_eq!(remaining.len(), 2);
}

#[test]
fn fetch_of_undecodable_rows_returns_fetch_failed() {
    let mut store = Store::open(
        StoreLocation::Memory,
        StoreConfig::default(),
        Box::new(StdoutSink),
    );
    store.save([&movie("a", "Alien")]).unwrap();

    let err = store.fetch_all::<MovieDecoy>().unwrap_err();
    assert!(matches!(err, StoreError::FetchFailed(_)));
    assert!(err.source().is_some());
}
