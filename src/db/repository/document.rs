use rusqlite::Connection;
use uuid::Uuid;

use super::{kv_get, kv_set};
use crate::db::DatabaseError;
use crate::models::VerificationDocument;

pub fn document_key(user_id: &Uuid) -> String {
    format!("document:{user_id}")
}

pub fn get_document(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<VerificationDocument>, DatabaseError> {
    kv_get(conn, &document_key(user_id))
}

/// One document per user; a new upload replaces the previous metadata.
pub fn put_document(conn: &Connection, doc: &VerificationDocument) -> Result<(), DatabaseError> {
    kv_set(conn, &document_key(&doc.user_id), doc)
}
