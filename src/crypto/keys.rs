use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;

/// Derived password hash: zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct PasswordHash {
    pub(super) hash_bytes: [u8; HASH_LENGTH],
}

impl PasswordHash {
    /// Derive from password + salt using PBKDF2-SHA256
    pub fn derive(password: &str, salt: &[u8], iterations: u32) -> Self {
        let mut hash_bytes = [0u8; HASH_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash_bytes);
        Self { hash_bytes }
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.hash_bytes
    }

    /// Constant-time comparison against a stored hash.
    pub fn matches(&self, stored: &[u8]) -> bool {
        stored.len() == HASH_LENGTH && bool::from(self.hash_bytes.ct_eq(stored))
    }
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
