//! Password hashing for staff accounts.
//!
//! Hashes are stored as `pbkdf2_sha256$<iterations>$<salt hex>$<key hex>`.

use crate::config::AuthConfig;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; AuthConfig::KEY_LEN] {
    let mut key = [0u8; AuthConfig::KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().into_bytes();
    hash_with_salt(password, &salt[..AuthConfig::SALT_LEN], AuthConfig::PBKDF2_ITERATIONS)
}

fn hash_with_salt(password: &str, salt: &[u8], iterations: u32) -> String {
    let key = derive_key(password, salt, iterations);
    format!(
        "{}${}${}${}",
        AuthConfig::HASH_SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(key)
    )
}

/// Check a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != AuthConfig::HASH_SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    if iterations == 0 || expected.len() != AuthConfig::KEY_LEN {
        return false;
    }

    let actual = derive_key(password, &salt, iterations);
    // Fold every byte so the comparison time does not depend on where the
    // first mismatch is.
    actual
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
