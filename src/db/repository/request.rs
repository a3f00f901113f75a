use rusqlite::Connection;
use uuid::Uuid;

use super::{kv_get, kv_get_by_prefix, kv_set};
use crate::db::DatabaseError;
use crate::models::ServiceRequest;

pub const REQUEST_PREFIX: &str = "request:";

pub fn request_key(id: &Uuid) -> String {
    format!("{REQUEST_PREFIX}{id}")
}

pub fn get_request(conn: &Connection, id: &Uuid) -> Result<Option<ServiceRequest>, DatabaseError> {
    kv_get(conn, &request_key(id))
}

pub fn put_request(conn: &Connection, request: &ServiceRequest) -> Result<(), DatabaseError> {
    kv_set(conn, &request_key(&request.id), request)
}

pub fn list_requests(conn: &Connection) -> Result<Vec<ServiceRequest>, DatabaseError> {
    kv_get_by_prefix(conn, REQUEST_PREFIX)
}
