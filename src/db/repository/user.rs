use rusqlite::Connection;
use uuid::Uuid;

use super::{kv_get, kv_get_by_prefix, kv_set};
use crate::db::DatabaseError;
use crate::models::User;

pub const USER_PREFIX: &str = "user:";

pub fn user_key(id: &Uuid) -> String {
    format!("{USER_PREFIX}{id}")
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    kv_get(conn, &user_key(id))
}

pub fn put_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    kv_set(conn, &user_key(&user.id), user)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    kv_get_by_prefix(conn, USER_PREFIX)
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    Ok(list_users(conn)?
        .into_iter()
        .find(|u| u.email.eq_ignore_ascii_case(email)))
}
