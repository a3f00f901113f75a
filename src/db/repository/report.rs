use rusqlite::Connection;
use uuid::Uuid;

use super::{kv_get, kv_get_by_prefix, kv_set};
use crate::db::DatabaseError;
use crate::models::Report;

pub const REPORT_PREFIX: &str = "report:";

pub fn report_key(id: &Uuid) -> String {
    format!("{REPORT_PREFIX}{id}")
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    kv_get(conn, &report_key(id))
}

pub fn put_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    kv_set(conn, &report_key(&report.id), report)
}

pub fn list_reports(conn: &Connection) -> Result<Vec<Report>, DatabaseError> {
    kv_get_by_prefix(conn, REPORT_PREFIX)
}
