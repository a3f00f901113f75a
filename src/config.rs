use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MediConnect";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen address for the HTTP API.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "mediconnect.db";

/// Maximum verification document size (10 MB).
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Default tracing filter when neither `MEDICONNECT_LOG` nor `RUST_LOG` is set.
pub fn default_log_filter() -> &'static str {
    "info,mediconnect_lib=debug,tower_http=info"
}

/// Get the application data directory
/// ~/MediConnect/ unless overridden by `MEDICONNECT_DATA_DIR`.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Get the verification documents directory
pub fn documents_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("documents")
}

/// Admin account seeded at startup so a fresh install can approve staff.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub log_filter: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid MEDICONNECT_BIND address {value}: {reason}")]
    InvalidBind { value: String, reason: String },
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("MEDICONNECT_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBind {
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let data_dir = lookup("MEDICONNECT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);

        let log_filter = lookup("MEDICONNECT_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| default_log_filter().to_string());

        let bootstrap_admin = match (
            lookup("MEDICONNECT_ADMIN_EMAIL"),
            lookup("MEDICONNECT_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin {
                    email,
                    password,
                    name: lookup("MEDICONNECT_ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
                })
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            data_dir,
            log_filter,
            bootstrap_admin,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}
