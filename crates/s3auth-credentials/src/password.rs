//! Password hashing and verification.
//!
//! New passwords hash with bcrypt at the library default cost. Verification
//! tries bcrypt first; on bcrypt failure (the stored hash predates the
//! bcrypt migration) a legacy SHA-256-hex comparison is attempted, and a
//! legacy match triggers an opportunistic rewrite to a fresh bcrypt hash.

use s3auth_core::AuthError;
use sha2::{Digest, Sha256};

/// Hash a new password with bcrypt at the library default cost.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if the password exceeds bcrypt's 72-byte
/// input ceiling or hashing otherwise fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| AuthError::Internal(e.into()))
}

/// The outcome of verifying a password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Whether the password matched.
    pub matched: bool,
    /// Whether the caller should rewrite the stored hash to a fresh bcrypt
    /// hash — set only on a successful legacy-hash match.
    pub needs_upgrade: bool,
}

/// Verify `password` against `stored_hash`.
///
/// Tries bcrypt compare first. If bcrypt rejects `stored_hash` outright (not
/// a valid bcrypt hash — the legacy case), falls back to comparing against
/// the legacy SHA-256 hex digest. Never returns an error — an unparseable
/// hash or a mismatch is simply a failed verification.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> VerifyOutcome {
    match bcrypt::verify(password, stored_hash) {
        Ok(matched) => VerifyOutcome { matched, needs_upgrade: false },
        Err(_) => {
            let matched = legacy_sha256_matches(password, stored_hash);
            VerifyOutcome { matched, needs_upgrade: matched }
        }
    }
}

fn legacy_sha256_matches(password: &str, stored_hash: &str) -> bool {
    let digest = hex::encode(Sha256::digest(password.as_bytes()));
    digest.eq_ignore_ascii_case(stored_hash)
}

/// Hash `password` with the legacy SHA-256-hex scheme. Exists only so tests
/// and migration tooling can produce fixtures; never used for new passwords.
#[must_use]
pub fn legacy_sha256_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_hash_and_verify_password_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        let outcome = verify_password("correct horse battery staple", &hash);
        assert!(outcome.matched);
        assert!(!outcome.needs_upgrade);
    }

    #[test]
    fn test_should_reject_wrong_password() {
        let hash = hash_password("right-password").unwrap();
        let outcome = verify_password("wrong-password", &hash);
        assert!(!outcome.matched);
    }

    #[test]
    fn test_should_hash_empty_password_successfully() {
        assert!(hash_password("").is_ok());
    }

    #[test]
    fn test_should_fail_hashing_password_over_72_bytes() {
        let long_password = "a".repeat(100);
        assert!(hash_password(&long_password).is_err());
    }

    #[test]
    fn test_should_verify_and_flag_upgrade_for_legacy_hash() {
        let legacy = legacy_sha256_hash("old-password");
        let outcome = verify_password("old-password", &legacy);
        assert!(outcome.matched);
        assert!(outcome.needs_upgrade);
    }

    #[test]
    fn test_should_reject_wrong_password_against_legacy_hash() {
        let legacy = legacy_sha256_hash("old-password");
        let outcome = verify_password("wrong", &legacy);
        assert!(!outcome.matched);
        assert!(!outcome.needs_upgrade);
    }
}
