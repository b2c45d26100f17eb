//! TOTP (RFC 6238) provisioning and verification.
//!
//! Provisioning produces a 30-second-period, 6-digit, SHA-1 HMAC secret
//! along with an `otpauth://` URL and a 256×256 PNG QR code encoding that
//! URL. Verification accepts the current 30-second window plus one window
//! before and after, tolerating ±30 s of clock skew between client and server.

use base32::Alphabet;
use hmac::{Hmac, KeyInit, Mac};
use image::ExtendedColorType;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use qrcode::QrCode;
use rand::Rng;
use s3auth_core::AuthError;
use sha1::Sha1;

const PERIOD_SECONDS: i64 = 30;
const DIGITS: u32 = 6;
const SECRET_BYTE_LEN: usize = 20;
const QR_DIMENSION: u32 = 256;

type HmacSha1 = Hmac<Sha1>;

/// A freshly-provisioned TOTP secret, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct Provisioned {
    /// Base32-encoded secret, as stored and as shown to the user for manual entry.
    pub base32_secret: String,
    /// The `otpauth://totp/...` URL, also encoded into `qr_png`.
    pub otpauth_url: String,
    /// A 256×256 PNG QR code encoding `otpauth_url`.
    pub qr_png: Vec<u8>,
}

/// Provision a new TOTP secret for `username` under `issuer`.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if QR code generation fails.
pub fn provision(issuer: &str, username: &str) -> Result<Provisioned, AuthError> {
    let mut secret_bytes = [0u8; SECRET_BYTE_LEN];
    rand::rng().fill_bytes(&mut secret_bytes);

    let base32_secret = base32::encode(Alphabet::Rfc4648 { padding: false }, &secret_bytes);
    let otpauth_url = build_otpauth_url(issuer, username, &base32_secret);
    let qr_png = render_qr_png(&otpauth_url)?;

    Ok(Provisioned { base32_secret, otpauth_url, qr_png })
}

fn build_otpauth_url(issuer: &str, username: &str, base32_secret: &str) -> String {
    let label = format!("{issuer}:{username}");
    format!(
        "otpauth://totp/{}?secret={base32_secret}&issuer={}&period={PERIOD_SECONDS}&digits={DIGITS}&algorithm=SHA1",
        urlencode(&label),
        urlencode(issuer),
    )
}

fn urlencode(s: &str) -> String {
    s.replace(' ', "%20").replace(':', "%3A")
}

fn render_qr_png(data: &str) -> Result<Vec<u8>, AuthError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| AuthError::Internal(e.into()))?;
    let image = code
        .render::<image::Luma<u8>>()
        .min_dimensions(QR_DIMENSION, QR_DIMENSION)
        .max_dimensions(QR_DIMENSION, QR_DIMENSION)
        .build();

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::L8)
        .map_err(|e| AuthError::Internal(e.into()))?;

    Ok(buf)
}

/// Verify a user-presented TOTP code against `base32_secret` at time `now`
/// (Unix epoch seconds).
///
/// Accepts the current window plus one window before and after. Malformed
/// input (non-numeric, wrong length) returns `false` without error.
#[must_use]
pub fn verify(base32_secret: &str, code: &str, now: i64) -> bool {
    if code.len() != DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let Some(secret_bytes) = base32::decode(Alphabet::Rfc4648 { padding: false }, base32_secret) else {
        return false;
    };

    let counter = now.div_euclid(PERIOD_SECONDS);
    [counter - 1, counter, counter + 1]
        .into_iter()
        .any(|c| hotp(&secret_bytes, c as u64) == code)
}

fn hotp(secret: &[u8], counter: u64) -> String {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let result = mac.finalize().into_bytes();

    let offset = (result[result.len() - 1] & 0xf) as usize;
    let truncated = (u32::from(result[offset] & 0x7f) << 24)
        | (u32::from(result[offset + 1]) << 16)
        | (u32::from(result[offset + 2]) << 8)
        | u32::from(result[offset + 3]);

    format!("{:0width$}", truncated % 10u32.pow(DIGITS), width = DIGITS as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_provision_with_expected_shape() {
        let provisioned = provision("s3auth", "alice").unwrap();
        assert!(!provisioned.base32_secret.is_empty());
        assert!(provisioned.otpauth_url.starts_with("otpauth://totp/"));
        assert!(provisioned.otpauth_url.contains("period=30"));
        assert!(provisioned.otpauth_url.contains("digits=6"));
        assert!(provisioned.otpauth_url.contains("algorithm=SHA1"));
        assert!(!provisioned.qr_png.is_empty());
        assert_eq!(&provisioned.qr_png[1..4], b"PNG");
    }

    #[test]
    fn test_should_verify_code_generated_for_current_window() {
        let provisioned = provision("s3auth", "alice").unwrap();
        let now = 1_700_000_000_i64;
        let secret_bytes = base32::decode(Alphabet::Rfc4648 { padding: false }, &provisioned.base32_secret).unwrap();
        let counter = now.div_euclid(PERIOD_SECONDS);
        let code = hotp(&secret_bytes, counter as u64);

        assert!(verify(&provisioned.base32_secret, &code, now));
    }

    #[test]
    fn test_should_accept_adjacent_window_codes() {
        let provisioned = provision("s3auth", "alice").unwrap();
        let now = 1_700_000_000_i64;
        let secret_bytes = base32::decode(Alphabet::Rfc4648 { padding: false }, &provisioned.base32_secret).unwrap();
        let counter = now.div_euclid(PERIOD_SECONDS);
        let prev_code = hotp(&secret_bytes, (counter - 1) as u64);

        assert!(verify(&provisioned.base32_secret, &prev_code, now));
    }

    #[test]
    fn test_should_reject_code_outside_window() {
        let provisioned = provision("s3auth", "alice").unwrap();
        let now = 1_700_000_000_i64;
        let secret_bytes = base32::decode(Alphabet::Rfc4648 { padding: false }, &provisioned.base32_secret).unwrap();
        let counter = now.div_euclid(PERIOD_SECONDS);
        let far_code = hotp(&secret_bytes, (counter - 5) as u64);

        assert!(!verify(&provisioned.base32_secret, &far_code, now));
    }

    #[test]
    fn test_should_reject_non_numeric_code_without_error() {
        let provisioned = provision("s3auth", "alice").unwrap();
        assert!(!verify(&provisioned.base32_secret, "abcdef", 0));
    }

    #[test]
    fn test_should_reject_wrong_length_code_without_error() {
        let provisioned = provision("s3auth", "alice").unwrap();
        assert!(!verify(&provisioned.base32_secret, "12345", 0));
        assert!(!verify(&provisioned.base32_secret, "1234567", 0));
    }
}
