//! Two-factor backup codes.
//!
//! Exactly 10 codes are generated per user, each 8 uniformly random
//! uppercase base32 characters formatted as `XXXX-XXXX`. Codes are hashed
//! individually with bcrypt before storage; a presented code is classified
//! by shape first, then checked against the stored hashes, then checked
//! against the used-codes list so a previously-consumed code cannot be
//! replayed even though its hash still matches.

use rand::RngExt;
use s3auth_core::AuthError;

/// Exactly 10 backup codes are issued per enable/regenerate call.
pub const BACKUP_CODE_COUNT: usize = 10;

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Generate [`BACKUP_CODE_COUNT`] fresh backup codes in `XXXX-XXXX` format.
#[must_use]
pub fn generate_codes() -> Vec<String> {
    (0..BACKUP_CODE_COUNT).map(|_| generate_one_code()).collect()
}

fn generate_one_code() -> String {
    let mut rng = rand::rng();
    let chars: String = (0..8)
        .map(|_| BASE32_ALPHABET[rng.random_range(0..BASE32_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", &chars[0..4], &chars[4..8])
}

/// Hash a batch of plaintext backup codes for storage.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if bcrypt hashing fails for any code.
pub fn hash_codes(codes: &[String]) -> Result<Vec<String>, AuthError> {
    codes
        .iter()
        .map(|code| bcrypt::hash(code, bcrypt::DEFAULT_COST).map_err(|e| AuthError::Internal(e.into())))
        .collect()
}

/// Whether `input` has the `XXXX-XXXX` backup-code shape (case-insensitive,
/// 8 alphanumeric characters plus the hyphen).
#[must_use]
pub fn has_backup_code_shape(input: &str) -> bool {
    let Some((left, right)) = input.split_once('-') else {
        return false;
    };
    left.len() == 4
        && right.len() == 4
        && left.chars().all(|c| c.is_ascii_alphanumeric())
        && right.chars().all(|c| c.is_ascii_alphanumeric())
}

/// The outcome of checking a presented backup code against stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupCodeCheck {
    /// Whether the code matched an unused stored hash.
    pub matched: bool,
    /// The index into `backup_code_hashes` of the matched hash, if any —
    /// the caller uses this to mark the specific hash used.
    pub matched_index: Option<usize>,
}

/// Check a presented backup code (with or without the hyphen) against the
/// outstanding hashes and the already-used hashes.
///
/// A code whose hash is present in `used_hashes` fails even though it still
/// matches a stored hash — that is the replay-prevention check.
#[must_use]
pub fn check_code(
    input: &str,
    backup_code_hashes: &[String],
    used_hashes: &[String],
) -> BackupCodeCheck {
    let stripped = input.replace('-', "");

    for (index, hash) in backup_code_hashes.iter().enumerate() {
        let Ok(true) = bcrypt::verify(&stripped, hash) else {
            continue;
        };
        if used_hashes.iter().any(|used| used == hash) {
            return BackupCodeCheck { matched: false, matched_index: None };
        }
        return BackupCodeCheck { matched: true, matched_index: Some(index) };
    }

    BackupCodeCheck { matched: false, matched_index: None }
}
