//! Typed data-access facade over the embedded store.
//!
//! # Responsibility
//! - Provide a uniform, type-generic interface for reading, upserting, and
//!   deleting collections of records.
//! - Translate engine errors into the small `StoreError` taxonomy and route
//!   failure detail through the gated debug channels.
//!
//! # Invariants
//! - Every store-touching operation checks handle availability first and
//!   returns `StoreError::Unavailable` without touching the engine when the
//!   handle is absent.
//! - The handle is mutated only by explicit `open`/`reset`, never re-created
//!   implicitly mid-call.
//! - Write operations run inside a single transaction; a failed write leaves
//!   no partial subset of the intended changes behind.

use crate::config::StoreConfig;
use crate::db::{open_store, open_store_in_memory, DbError, DbResult};
use crate::debug::{error_line, message_line, DebugSink};
use crate::record::Record;
use log::{error, info};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const RECORD_SELECT_SQL: &str = "SELECT key, body FROM records WHERE collection = ?1;";

pub type StoreResult<T> = Result<T, StoreError>;

/// Flat error taxonomy surfaced to callers.
///
/// Write failures keep the underlying cause (also logged through the error
/// debug channel before the error is returned), reachable via
/// `Error::source`.
#[derive(Debug)]
pub enum StoreError {
    /// The store handle could not be obtained; the engine is not ready.
    Unavailable,
    /// A read query or row decode raised.
    FetchFailed(DbError),
    /// The write transaction for a save raised.
    SaveFailed(DbError),
    /// The write transaction for a delete raised.
    DeleteFailed(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "store instance not available"),
            Self::FetchFailed(err) => write!(f, "fetch failed: {err}"),
            Self::SaveFailed(err) => write!(f, "save failed: {err}"),
            Self::DeleteFailed(err) => write!(f, "delete failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable => None,
            Self::FetchFailed(err) | Self::SaveFailed(err) | Self::DeleteFailed(err) => Some(err),
        }
    }
}

/// Where the store handle is (re)acquired from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Engine-managed memory; data lifetime is tied to the handle, so a
    /// `reset` discards all records.
    Memory,
    /// Database file on disk; data survives `reset`.
    File(PathBuf),
}

impl StoreLocation {
    fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }

    fn acquire(&self) -> DbResult<Connection> {
        match self {
            Self::Memory => open_store_in_memory(),
            Self::File(path) => open_store(path),
        }
    }
}

/// Data-access facade owning an optional handle to the embedded store.
///
/// Handle state machine is `{Uninitialized <-> Ready}`. All operations are
/// single synchronous attempts on the caller's thread; mutating operations
/// take `&mut self`, so a reset can never race an in-flight operation within
/// one thread. Share across threads behind an external `Mutex`.
pub struct Store {
    conn: Option<Connection>,
    location: StoreLocation,
    config: StoreConfig,
    sink: Box<dyn DebugSink>,
}

impl Store {
    /// Creates an uninitialized store. No I/O happens until `reset`.
    pub fn new(location: StoreLocation, config: StoreConfig, sink: Box<dyn DebugSink>) -> Self {
        Self {
            conn: None,
            location,
            config,
            sink,
        }
    }

    /// Creates a store and immediately attempts handle acquisition.
    ///
    /// Acquisition failure is logged, not returned; the store starts
    /// uninitialized and every operation reports `Unavailable` until a
    /// later `reset` succeeds.
    pub fn open(location: StoreLocation, config: StoreConfig, sink: Box<dyn DebugSink>) -> Self {
        let mut store = Self::new(location, config, sink);
        store.reset();
        store
    }

    /// Whether a live handle is currently held.
    pub fn is_ready(&self) -> bool {
        self.conn.is_some()
    }

    /// Drops the current handle and re-attempts acquisition.
    ///
    /// Ends Ready on success, Uninitialized on failure. This forces store
    /// re-acquisition only; for a file-backed store the data is untouched.
    pub fn reset(&mut self) {
        self.conn = None;
        match self.location.acquire() {
            Ok(conn) => {
                info!(
                    "event=store_reset module=store status=ok mode={}",
                    self.location.mode()
                );
                self.conn = Some(conn);
            }
            Err(err) => {
                error!(
                    "event=store_reset module=store status=error mode={} error={err}",
                    self.location.mode()
                );
                self.debug_error(&format!("store open failed: {err}"));
            }
        }
    }

    /// Returns every stored record of type `T`.
    ///
    /// The result reflects the store's committed state at call time; row
    /// ordering is whatever the engine returns and is not guaranteed stable.
    pub fn fetch_all<T: Record>(&self) -> StoreResult<Vec<T>> {
        let conn = self.handle()?;
        fetch_collection::<T>(conn).map_err(|err| {
            self.debug_error(&format!("fetch failed for `{}`: {err}", T::COLLECTION));
            StoreError::FetchFailed(err)
        })
    }

    /// Returns the stored records of type `T` matching `predicate`.
    pub fn fetch_filtered<T, P>(&self, predicate: P) -> StoreResult<Vec<T>>
    where
        T: Record,
        P: Fn(&T) -> bool,
    {
        let mut records = self.fetch_all::<T>()?;
        records.retain(|record| predicate(record));
        Ok(records)
    }

    /// Persists the given records in one atomic transaction.
    ///
    /// Semantics are upsert keyed on `Record::key`: an existing record with
    /// the same key is overwritten with the new values. On failure nothing
    /// is persisted.
    pub fn save<'a, T, I>(&mut self, records: I) -> StoreResult<()>
    where
        T: Record + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let outcome = match self.conn.as_mut() {
            Some(conn) => upsert_records(conn, records),
            None => return Err(self.unavailable()),
        };
        outcome.map_err(|err| {
            self.debug_error(&format!("save failed for `{}`: {err}", T::COLLECTION));
            StoreError::SaveFailed(err)
        })
    }

    /// Deletes every record of type `T` in one atomic transaction.
    pub fn delete_all<T: Record>(&mut self) -> StoreResult<()> {
        let outcome = match self.conn.as_mut() {
            Some(conn) => delete_collection(conn, T::COLLECTION),
            None => return Err(self.unavailable()),
        };
        outcome.map_err(|err| {
            self.debug_error(&format!("delete failed for `{}`: {err}", T::COLLECTION));
            StoreError::DeleteFailed(err)
        })
    }

    /// Deletes exactly the records of type `T` matching `predicate`, in one
    /// atomic transaction. Non-matching records are untouched; if any row
    /// fails to decode, nothing is deleted.
    pub fn delete_filtered<T, P>(&mut self, predicate: P) -> StoreResult<()>
    where
        T: Record,
        P: Fn(&T) -> bool,
    {
        let outcome = match self.conn.as_mut() {
            Some(conn) => delete_matching(conn, predicate),
            None => return Err(self.unavailable()),
        };
        outcome.map_err(|err| {
            self.debug_error(&format!("delete failed for `{}`: {err}", T::COLLECTION));
            StoreError::DeleteFailed(err)
        })
    }

    /// Emits a line on the error debug channel when the configured verbosity
    /// enables it. Never fails.
    pub fn debug_error(&self, text: &str) {
        if self.config.debug.emits_errors() {
            self.sink.line(&error_line(text));
        }
    }

    /// Emits a line on the message debug channel when the configured
    /// verbosity enables it. Never fails.
    pub fn debug_message(&self, text: &str) {
        if self.config.debug.emits_messages() {
            self.sink.line(&message_line(text));
        }
    }

    fn handle(&self) -> StoreResult<&Connection> {
        match &self.conn {
            Some(conn) => Ok(conn),
            None => Err(self.unavailable()),
        }
    }

    fn unavailable(&self) -> StoreError {
        self.debug_error(&StoreError::Unavailable.to_string());
        StoreError::Unavailable
    }
}

fn fetch_collection<T: Record>(conn: &Connection) -> DbResult<Vec<T>> {
    let mut stmt = conn.prepare(RECORD_SELECT_SQL)?;
    let mut rows = stmt.query([T::COLLECTION])?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let key: String = row.get("key")?;
        let body: String = row.get("body")?;
        records.push(decode_body(&key, &body)?);
    }

    Ok(records)
}

fn upsert_records<'a, T, I>(conn: &mut Connection, records: I) -> DbResult<()>
where
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO records (collection, key, body, updated_at)
             VALUES (?1, ?2, ?3, strftime('%s', 'now') * 1000)
             ON CONFLICT (collection, key) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at;",
        )?;
        for record in records {
            let body = encode_body(record)?;
            stmt.execute(params![T::COLLECTION, record.key(), body])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn delete_collection(conn: &mut Connection, collection: &'static str) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM records WHERE collection = ?1;", [collection])?;
    tx.commit()?;
    Ok(())
}

fn delete_matching<T, P>(conn: &mut Connection, predicate: P) -> DbResult<()>
where
    T: Record,
    P: Fn(&T) -> bool,
{
    let tx = conn.transaction()?;
    {
        let mut doomed: Vec<String> = Vec::new();
        let mut stmt = tx.prepare(RECORD_SELECT_SQL)?;
        let mut rows = stmt.query([T::COLLECTION])?;
        while let Some(row) = rows.next()? {
            let key: String = row.get("key")?;
            let body: String = row.get("body")?;
            let record: T = decode_body(&key, &body)?;
            if predicate(&record) {
                doomed.push(key);
            }
        }
        drop(rows);
        drop(stmt);

        let mut delete_stmt =
            tx.prepare("DELETE FROM records WHERE collection = ?1 AND key = ?2;")?;
        for key in &doomed {
            delete_stmt.execute(params![T::COLLECTION, key])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn encode_body<T: Record>(record: &T) -> DbResult<String> {
    serde_json::to_string(record).map_err(|err| DbError::Encode {
        collection: T::COLLECTION,
        detail: err.to_string(),
    })
}

fn decode_body<T: Record>(key: &str, body: &str) -> DbResult<T> {
    serde_json::from_str(body).map_err(|err| DbError::Corrupt {
        collection: T::COLLECTION,
        key: key.to_string(),
        detail: err.to_string(),
    })
}
