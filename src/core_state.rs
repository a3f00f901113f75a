//! Shared application state handed to every HTTP handler.
//!
//! `CoreState` owns the store handle plus the two injected adapters
//! (identity provider, object store). It is wrapped in `Arc` at startup;
//! nothing in here is global.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{self, ServerConfig};
use crate::db::{self, Store};
use crate::identity::{IdentityError, IdentityProvider, LocalIdentityProvider};
use crate::models::User;
use crate::storage::{FsObjectStore, MemoryObjectStore, ObjectStore, StorageError};

/// PBKDF2 rounds for `CoreState::in_memory`. Production uses the full count.
const TEST_PBKDF2_ITERATIONS: u32 = 1_000;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    store: Store,
    identity: Arc<dyn IdentityProvider>,
    objects: Arc<dyn ObjectStore>,
}

impl CoreState {
    pub fn new(
        store: Store,
        identity: Arc<dyn IdentityProvider>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            store,
            identity,
            objects,
        }
    }

    /// Open the on-disk database and document directory under `data_dir`.
    pub fn open(config: &ServerConfig) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&config.data_dir).map_err(StorageError::from)?;
        let store = Store::open(&config.database_path())?;
        let identity = Arc::new(LocalIdentityProvider::new(store.clone()));
        let objects = Arc::new(FsObjectStore::new(config::documents_dir(&config.data_dir)));
        tracing::info!(data_dir = %config.data_dir.display(), "Core state opened");
        Ok(Self::new(store, identity, objects))
    }

    /// Volatile state for tests: in-memory SQLite, cheap password hashing,
    /// in-memory object store.
    pub fn in_memory() -> Result<Self, CoreError> {
        let store = Store::in_memory()?;
        let identity = Arc::new(LocalIdentityProvider::with_iterations(
            store.clone(),
            TEST_PBKDF2_ITERATIONS,
        ));
        Ok(Self::new(store, identity, Arc::new(MemoryObjectStore::new())))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    /// Load a profile by id.
    pub fn user(&self, id: &Uuid) -> Result<Option<User>, CoreError> {
        Ok(self.store.with_conn(|conn| db::get_user(conn, id))?)
    }

    /// Resolve a bearer token to the caller's profile.
    ///
    /// Unknown tokens are `Unauthenticated`. A valid token whose profile is
    /// missing is `NotFound("User data not found")`.
    pub fn resolve_caller(&self, token: &str) -> Result<User, CoreError> {
        let user_id = self
            .identity
            .resolve_token(token)?
            .ok_or(CoreError::Unauthenticated)?;
        self.user(&user_id)?
            .ok_or_else(|| CoreError::NotFound("User data not found".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors from domain operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Identity provider error: {0}")]
    Identity(String),
    #[error("Object store error: {0}")]
    Storage(#[from] StorageError),
}

impl CoreError {
    /// Store, identity and object-store failures. Their detail is logged, not returned.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CoreError::Database(_) | CoreError::Identity(_) | CoreError::Storage(_)
        )
    }
}

impl From<IdentityError> for CoreError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken | IdentityError::InvalidCredentials => {
                CoreError::Validation(err.to_string())
            }
            IdentityError::UnknownIdentity => CoreError::NotFound("User not found".into()),
            // The identity backend failed, not the record store.
            IdentityError::Database(e) => CoreError::Identity(e.to_string()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn unknown_token_is_unauthenticated() {
        let state = CoreState::in_memory().unwrap();
        let err = state.resolve_caller("bogus").unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated));
    }

    #[test]
    fn token_without_profile_is_not_found() {
        let state = CoreState::in_memory().unwrap();
        state.identity().create_user("ghost@example.com", "pw").unwrap();
        let session = state.identity().sign_in("ghost@example.com", "pw").unwrap();
        let err = state.resolve_caller(&session.access_token).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(ref m) if m == "User data not found"));
    }

    #[test]
    fn token_resolves_to_stored_profile() {
        let state = CoreState::in_memory().unwrap();
        let id = state.identity().create_user("p@example.com", "pw").unwrap();
        let user = User::new(id, "p@example.com".into(), "Pat".into(), Role::Patient, chrono::Utc::now());
        state.store().with_conn(|conn| db::put_user(conn, &user)).unwrap();

        let session = state.identity().sign_in("p@example.com", "pw").unwrap();
        let caller = state.resolve_caller(&session.access_token).unwrap();
        assert_eq!(caller.id, id);
    }

    #[test]
    fn open_creates_data_dir_and_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            data_dir: dir.path().join("data"),
            log_filter: "warn".into(),
            bootstrap_admin: None,
        };
        let _state = CoreState::open(&config).unwrap();
        assert!(config.database_path().exists());
    }

    #[test]
    fn identity_errors_map_to_domain_errors() {
        assert!(matches!(
            CoreError::from(IdentityError::EmailTaken),
            CoreError::Validation(_)
        ));
        assert!(matches!(
            CoreError::from(IdentityError::UnknownIdentity),
            CoreError::NotFound(_)
        ));
        let backend = CoreError::from(IdentityError::Database(db::DatabaseError::LockPoisoned));
        assert!(matches!(backend, CoreError::Identity(ref m) if m.contains("lock poisoned")));
        assert!(backend.is_upstream());
        assert!(!CoreError::Unauthenticated.is_upstream());
    }

    #[test]
    fn core_error_display() {
        assert_eq!(CoreError::Unauthenticated.to_string(), "Unauthorized");
        assert_eq!(
            CoreError::Forbidden("Admin access required".into()).to_string(),
            "Admin access required"
        );
    }
}
