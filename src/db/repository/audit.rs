use rusqlite::Connection;

use super::{kv_get_by_prefix, kv_set};
use crate::db::DatabaseError;
use crate::models::AuditLogEntry;

pub const AUDIT_PREFIX: &str = "audit:";

/// Keys sort chronologically: zero-padded microsecond timestamp, then entry id.
pub fn audit_key(entry: &AuditLogEntry) -> String {
    format!(
        "{AUDIT_PREFIX}{:020}:{}",
        entry.timestamp.timestamp_micros().max(0),
        entry.id
    )
}

/// Append an entry. Entries are never updated or deleted.
pub fn insert_audit_entry(conn: &Connection, entry: &AuditLogEntry) -> Result<(), DatabaseError> {
    kv_set(conn, &audit_key(entry), entry)
}

/// All entries, newest first.
pub fn list_audit_entries(conn: &Connection) -> Result<Vec<AuditLogEntry>, DatabaseError> {
    let mut entries: Vec<AuditLogEntry> = kv_get_by_prefix(conn, AUDIT_PREFIX)?;
    // Key order is oldest first; reversing keeps same-timestamp entries stable.
    entries.reverse();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(entries)
}
