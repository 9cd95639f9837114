//! Secret field transform — one-way, salted, iterated SHA-256 derivation of
//! the password field.
//!
//! Stored encoding: `{iterations}${salt}${digest}` (salt and digest hex).
//! The iteration count is the tunable work factor; `verify` reads it back
//! from the stored value, so records hashed under an older factor keep
//! verifying after the configuration changes.

use rand::Rng;
use sha2::{Digest, Sha256};

pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct SecretHasher {
    iterations: u32,
}

impl SecretHasher {
    pub fn new(iterations: u32) -> Self {
        SecretHasher {
            iterations: iterations.max(1),
        }
    }

    /// Derives the stored form of a plaintext secret under a fresh salt.
    pub fn hash(&self, plaintext: &str) -> String {
        let salt: u128 = rand::thread_rng().gen();
        let salt = format!("{salt:032x}");
        let digest = derive(plaintext, &salt, self.iterations);
        format!("{}${salt}${digest}", self.iterations)
    }

    /// Checks a plaintext against a stored transform.
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let mut parts = stored.splitn(3, '$');
        let (Some(iterations), Some(salt), Some(digest)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let Ok(iterations) = iterations.parse::<u32>() else {
            return false;
        };
        derive(plaintext, salt, iterations) == digest
    }

    /// Returns the transform for `plaintext`, re-deriving only when the
    /// plaintext no longer matches `stored`. Keeps an unchanged password from
    /// being re-hashed (and re-salted) on every edit.
    pub fn apply_if_changed(&self, plaintext: &str, stored: &str) -> String {
        if self.verify(plaintext, stored) {
            stored.to_string()
        } else {
            self.hash(plaintext)
        }
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        SecretHasher::new(DEFAULT_ITERATIONS)
    }
}

fn derive(plaintext: &str, salt: &str, iterations: u32) -> String {
    let mut digest = {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(plaintext.as_bytes());
        hasher.finalize()
    };
    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(digest);
        digest = hasher.finalize();
    }
    format!("{digest:x}")
}
