use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Stored credential row for the local identity provider.
#[derive(Debug, Clone)]
pub struct CredentialRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
}

pub fn insert_credential(conn: &Connection, row: &CredentialRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO identities (id, email, password_hash, salt) VALUES (?1, ?2, ?3, ?4)",
        params![row.id.to_string(), row.email, row.password_hash, row.salt],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation("identities.email".into())
        }
        other => DatabaseError::from(other),
    })?;
    Ok(())
}

pub fn get_credential_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<CredentialRow>, DatabaseError> {
    conn.query_row(
        "SELECT id, email, password_hash, salt FROM identities WHERE email = ?1",
        [email],
        |row| {
            Ok(CredentialRow {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
                email: row.get(1)?,
                password_hash: row.get(2)?,
                salt: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Replace the hash and salt. Returns false when the id is unknown.
pub fn update_credential_password(
    conn: &Connection,
    id: &Uuid,
    password_hash: &[u8],
    salt: &[u8],
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE identities SET password_hash = ?2, salt = ?3 WHERE id = ?1",
        params![id.to_string(), password_hash, salt],
    )?;
    Ok(updated > 0)
}

pub fn insert_session(conn: &Connection, token_hash: &[u8; 32], user_id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id) VALUES (?1, ?2)",
        params![token_hash.as_slice(), user_id.to_string()],
    )?;
    Ok(())
}

pub fn get_session_user(conn: &Connection, token_hash: &[u8; 32]) -> Result<Option<Uuid>, DatabaseError> {
    let id: Option<String> = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token_hash = ?1",
            [token_hash.as_slice()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.and_then(|s| Uuid::parse_str(&s).ok()))
}

pub fn delete_session(conn: &Connection, token_hash: &[u8; 32]) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        [token_hash.as_slice()],
    )?;
    Ok(deleted > 0)
}
