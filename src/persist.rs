// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Snapshot persistence over a string key-value store, plus the schema
//! migration pipeline that upgrades older documents on load.

use crate::models::{CURRENT_VERSION, DEFAULT_THRESHOLD, PartialSnapshot, Snapshot};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const CURRENT_KEY: &str = "finmind_data_v2";
pub const LEGACY_KEY: &str = "finmind_data_v1";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no migration registered for schema version {0}")]
    NoMigration(u32),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Read-one-string / write-one-string blob storage.
pub trait KvStore {
    fn load(&self, key: &str) -> Result<Option<String>, Error>;
    fn save(&self, key: &str, value: &str) -> Result<(), Error>;
}

impl<K: KvStore + ?Sized> KvStore for &K {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).load(key)
    }
    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        (**self).save(key, value)
    }
}

impl<K: KvStore + ?Sized> KvStore for Arc<K> {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).load(key)
    }
    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        (**self).save(key, value)
    }
}

/// Key-value table inside a SQLite database.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    pub fn new(conn: Connection) -> Result<Self, Error> {
        conn.execute_batch(
            r#"
        CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
        )?;
        Ok(SqliteKv { conn })
    }

    pub fn open(path: &Path) -> Result<Self, Error> {
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Self::new(Connection::open_in_memory()?)
    }
}

impl KvStore for SqliteKv {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        let v = self
            .conn
            .query_row("SELECT value FROM kv WHERE key=?1", params![key], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(v)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        self.conn.execute(
            "INSERT INTO kv(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local store; nothing outlives the value.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let kv = Self::default();
        if let Ok(mut m) = kv.entries.lock() {
            m.insert(key.to_string(), value.to_string());
        }
        kv
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl KvStore for MemoryKv {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        let m = self
            .entries
            .lock()
            .map_err(|e| Error::Unavailable(e.to_string()))?;
        Ok(m.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut m = self
            .entries
            .lock()
            .map_err(|e| Error::Unavailable(e.to_string()))?;
        m.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Result of reading whatever snapshot storage holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub partial: PartialSnapshot,
    /// Schema version detected before migration.
    pub from_version: u32,
    pub migrated: bool,
}

type Migration = fn(Value) -> Value;

/// `(from_version, step)`: each step lifts a document by exactly one version.
const MIGRATIONS: &[(u32, Migration)] = &[(1, migrate_v1_to_v2)];

/// v1 had no incomes and no monthly budgets.
fn migrate_v1_to_v2(doc: Value) -> Value {
    let list = |field: &str| {
        doc.get(field)
            .filter(|v| v.is_array())
            .cloned()
            .unwrap_or_else(|| json!([]))
    };
    json!({
        "__version": 2,
        "expenses": list("expenses"),
        "incomes": [],
        "wishlist": list("wishlist"),
        "budgets": doc.get("budgets").filter(|v| v.is_object()).cloned().unwrap_or_else(|| json!({})),
        "budgetsByMonth": [],
        "threshold": doc.get("threshold").and_then(Value::as_f64).unwrap_or(DEFAULT_THRESHOLD),
    })
}

/// Runs migrations in order until the document reaches `CURRENT_VERSION`.
pub fn upgrade(mut doc: Value, mut version: u32) -> Result<Value, Error> {
    while version < CURRENT_VERSION {
        let (_, step) = MIGRATIONS
            .iter()
            .find(|(from, _)| *from == version)
            .ok_or(Error::NoMigration(version))?;
        doc = step(doc);
        version += 1;
        tracing::info!(version, "snapshot migrated");
    }
    Ok(doc)
}

fn detect_version(doc: &Value, fallback: u32) -> u32 {
    doc.get("__version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(fallback)
}

/// Current key first, legacy key second. `Ok(None)` when neither exists.
///
/// Only the legacy key goes through the migration pipeline. A document under
/// the current key is already in the current layout whatever its `__version`
/// says, so it is hydrated as-is.
pub fn load<K: KvStore>(kv: &K) -> Result<Option<Loaded>, Error> {
    let (doc, from_version) = match read_present(kv, CURRENT_KEY)? {
        Some(raw) => {
            let doc: Value = serde_json::from_str(&raw)?;
            let version = detect_version(&doc, CURRENT_VERSION);
            if version > CURRENT_VERSION {
                tracing::warn!(version, "snapshot written by a newer schema; reading known fields");
            }
            (doc, version.max(CURRENT_VERSION))
        }
        None => match read_present(kv, LEGACY_KEY)? {
            Some(raw) => (upgrade(serde_json::from_str(&raw)?, 1)?, 1),
            None => return Ok(None),
        },
    };
    Ok(Some(Loaded {
        partial: PartialSnapshot::from_value(&doc),
        from_version,
        migrated: from_version < CURRENT_VERSION,
    }))
}

/// Blank values count as absent.
fn read_present<K: KvStore>(kv: &K, key: &str) -> Result<Option<String>, Error> {
    Ok(kv.load(key)?.filter(|raw| !raw.trim().is_empty()))
}

pub fn save<K: KvStore>(kv: &K, state: &Snapshot) -> Result<(), Error> {
    kv.save(CURRENT_KEY, &state.to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_kv_upserts() {
        let kv = SqliteKv::open_in_memory().unwrap();
        assert_eq!(kv.load("k").unwrap(), None);
        kv.save("k", "one").unwrap();
        kv.save("k", "two").unwrap();
        assert_eq!(kv.load("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn v1_document_is_upgraded() {
        let v1 = json!({
            "expenses": [{"id":"e1","date":"2024-12-01","amount":20,"category":"Food & Drinks"}],
            "wishlist": "not a list",
            "budgets": {"Shopping": 300},
            "threshold": 0.8
        });
        let v2 = upgrade(v1, 1).unwrap();
        assert_eq!(v2["__version"], 2);
        assert_eq!(v2["incomes"], json!([]));
        assert_eq!(v2["budgetsByMonth"], json!([]));
        assert_eq!(v2["wishlist"], json!([]));
        assert_eq!(v2["budgets"]["Shopping"], 300);
        assert_eq!(v2["threshold"], 0.8);
    }

    #[test]
    fn unknown_old_version_has_no_migration() {
        assert!(matches!(upgrade(json!({}), 0), Err(Error::NoMigration(0))));
    }

    #[test]
    fn current_key_wins_over_legacy() {
        let kv = MemoryKv::new();
        kv.save(LEGACY_KEY, r#"{"threshold":0.5}"#).unwrap();
        kv.save(CURRENT_KEY, r#"{"__version":2,"threshold":0.7}"#).unwrap();
        let loaded = load(&kv).unwrap().unwrap();
        assert!(!loaded.migrated);
        assert_eq!(loaded.partial.threshold, Some(0.7));
    }

    #[test]
    fn corrupt_payload_is_an_error() {
        let kv = MemoryKv::with_entry(CURRENT_KEY, "{not json");
        assert!(matches!(load(&kv), Err(Error::Json(_))));
    }

    #[test]
    fn empty_storage_loads_nothing() {
        assert!(load(&MemoryKv::new()).unwrap().is_none());
    }
}
