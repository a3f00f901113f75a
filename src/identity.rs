//! Identity provider seam.
//!
//! Credential checks and bearer-token issuance sit behind the
//! `IdentityProvider` trait so the service can be pointed at an external
//! provider. `LocalIdentityProvider` is the bundled implementation:
//! PBKDF2-SHA256 password hashes and random bearer tokens stored only as
//! SHA-256 digests, both in the service database.

use uuid::Uuid;

use crate::crypto::{self, generate_salt, PasswordHash};
use crate::db::{self, DatabaseError, Store};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user_id: Uuid,
    pub access_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("A user with this email address has already been registered")]
    EmailTaken,
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("Identity not found")]
    UnknownIdentity,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Authenticates credentials and maps bearer tokens to user ids.
pub trait IdentityProvider: Send + Sync {
    /// Register credentials and return the new stable user id.
    fn create_user(&self, email: &str, password: &str) -> Result<Uuid, IdentityError>;

    /// Check credentials and issue a fresh bearer token.
    fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, IdentityError>;

    /// Resolve a bearer token. `Ok(None)` for unknown or revoked tokens.
    fn resolve_token(&self, token: &str) -> Result<Option<Uuid>, IdentityError>;

    fn revoke_token(&self, token: &str) -> Result<(), IdentityError>;

    fn update_password(&self, user_id: &Uuid, new_password: &str) -> Result<(), IdentityError>;
}

// ═══════════════════════════════════════════════════════════
// Local provider
// ═══════════════════════════════════════════════════════════

pub struct LocalIdentityProvider {
    store: Store,
    iterations: u32,
}

impl LocalIdentityProvider {
    pub fn new(store: Store) -> Self {
        Self::with_iterations(store, crypto::PBKDF2_ITERATIONS)
    }

    /// Lower iteration counts are only meant for tests.
    pub fn with_iterations(store: Store, iterations: u32) -> Self {
        Self { store, iterations }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl IdentityProvider for LocalIdentityProvider {
    fn create_user(&self, email: &str, password: &str) -> Result<Uuid, IdentityError> {
        let salt = generate_salt();
        let hash = PasswordHash::derive(password, &salt, self.iterations);
        let row = db::CredentialRow {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash: hash.as_bytes().to_vec(),
            salt: salt.to_vec(),
        };
        self.store
            .with_conn(|conn| db::insert_credential(conn, &row))
            .map_err(|e| match e {
                DatabaseError::ConstraintViolation(_) => IdentityError::EmailTaken,
                other => IdentityError::Database(other),
            })?;
        tracing::debug!(user_id = %row.id, "Identity created");
        Ok(row.id)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, IdentityError> {
        let row = self
            .store
            .with_conn(|conn| db::get_credential_by_email(conn, &normalize_email(email)))?
            .ok_or(IdentityError::InvalidCredentials)?;

        let hash = PasswordHash::derive(password, &row.salt, self.iterations);
        if !hash.matches(&row.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }

        let access_token = crypto::generate_token();
        let token_hash = crypto::hash_token(&access_token);
        self.store
            .with_conn(|conn| db::insert_session(conn, &token_hash, &row.id))?;

        Ok(IssuedSession {
            user_id: row.id,
            access_token,
        })
    }

    fn resolve_token(&self, token: &str) -> Result<Option<Uuid>, IdentityError> {
        let token_hash = crypto::hash_token(token);
        Ok(self
            .store
            .with_conn(|conn| db::get_session_user(conn, &token_hash))?)
    }

    fn revoke_token(&self, token: &str) -> Result<(), IdentityError> {
        let token_hash = crypto::hash_token(token);
        self.store
            .with_conn(|conn| db::delete_session(conn, &token_hash))?;
        Ok(())
    }

    fn update_password(&self, user_id: &Uuid, new_password: &str) -> Result<(), IdentityError> {
        let salt = generate_salt();
        let hash = PasswordHash::derive(new_password, &salt, self.iterations);
        let updated = self.store.with_conn(|conn| {
            db::update_credential_password(conn, user_id, hash.as_bytes(), &salt)
        })?;
        if !updated {
            return Err(IdentityError::UnknownIdentity);
        }
        Ok(())
    }
}
