use rusqlite::Connection;
use uuid::Uuid;

use super::{kv_get_by_prefix, kv_set};
use crate::db::DatabaseError;
use crate::models::Review;

pub const REVIEW_PREFIX: &str = "review:";

pub fn review_key(id: &Uuid) -> String {
    format!("{REVIEW_PREFIX}{id}")
}

pub fn put_review(conn: &Connection, review: &Review) -> Result<(), DatabaseError> {
    kv_set(conn, &review_key(&review.id), review)
}

pub fn list_reviews(conn: &Connection) -> Result<Vec<Review>, DatabaseError> {
    kv_get_by_prefix(conn, REVIEW_PREFIX)
}
