//! Repository layer over the flat key-value table.
//!
//! Every record is a JSON document stored under `<prefix>:<id>`. Queries
//! are prefix scans filtered in memory; the entity sub-modules wrap the
//! raw `kv_*` functions with typed keys.

mod audit;
mod credential;
mod document;
mod report;
mod request;
mod review;
mod user;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::DatabaseError;

pub use audit::*;
pub use credential::*;
pub use document::*;
pub use report::*;
pub use request::*;
pub use review::*;
pub use user::*;

/// Fetch and decode one document.
pub fn kv_get<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>, DatabaseError> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    raw.map(|json| decode(key, &json)).transpose()
}

/// Insert or replace a document. Unconditional: the last writer wins.
pub fn kv_set<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<(), DatabaseError> {
    let json = serde_json::to_string(value).map_err(|source| DatabaseError::Serialize {
        key: key.to_string(),
        source,
    })?;
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, json],
    )?;
    Ok(())
}

/// Decode every document whose key starts with `prefix`, in key order.
pub fn kv_get_by_prefix<T: DeserializeOwned>(
    conn: &Connection,
    prefix: &str,
) -> Result<Vec<T>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT key, value FROM kv_store
         WHERE substr(key, 1, length(?1)) = ?1
         ORDER BY key",
    )?;
    let rows = stmt
        .query_map([prefix], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    rows.iter().map(|(key, json)| decode(key, json)).collect()
}

fn decode<T: DeserializeOwned>(key: &str, json: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(json).map_err(|source| DatabaseError::Corrupted {
        key: key.to_string(),
        source,
    })
}
