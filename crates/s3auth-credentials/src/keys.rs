//! AWS-compatible access key generation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngExt;

const ACCESS_KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ACCESS_KEY_ID_RANDOM_LEN: usize = 16;
const SECRET_KEY_BYTE_LEN: usize = 30;

/// Generate a new access key ID: `AKIA` followed by 16 random
/// uppercase-alphanumeric characters (20 characters total).
#[must_use]
pub fn generate_access_key_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ACCESS_KEY_ID_RANDOM_LEN)
        .map(|_| ACCESS_KEY_ALPHABET[rng.random_range(0..ACCESS_KEY_ALPHABET.len())] as char)
        .collect();
    format!("AKIA{suffix}")
}

/// Generate a new secret access key: 30 random bytes, standard base64
/// encoded (40 characters).
#[must_use]
pub fn generate_secret_access_key() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; SECRET_KEY_BYTE_LEN];
    rng.fill(&mut buf);
    BASE64.encode(buf)
}
