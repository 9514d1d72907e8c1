//! Password hashing and credential checks for the user registry.
//!
//! Hashes are salted per user: a random 16-byte salt is drawn at
//! registration and stored next to the digest as `<salt_hex>$<digest_hex>`,
//! all inside the single password column of the row store.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));

/// Shape check only. Deliverability is the mail sender's problem.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn digest_hex(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::rng().random();
    format!("{}${}", hex::encode(salt), digest_hex(&salt, password))
}

/// Verify a plaintext password against a stored `<salt_hex>$<digest_hex>` value.
///
/// Returns `false` for malformed stored values rather than erroring; a row
/// that cannot be parsed can never authenticate.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    digest_hex(&salt, password) == digest
}
