//! Hashing helpers for session token fingerprints.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint stored for a refresh token's `jti`.
///
/// Sessions never persist the raw token id, only this digest.
pub fn session_fingerprint(jti: &str) -> String {
    sha256_hex(&format!("session:{jti}"))
}
