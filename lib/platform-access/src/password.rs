//! Salted PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`, so the
//! iteration count can be raised later without invalidating stored hashes.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

/// Iteration count for new hashes.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_SIZE: usize = 16;
const HASH_SIZE: usize = 32;

/// Hashes a password with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let mut derived = [0u8; HASH_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);

    format!(
        "{SCHEME}${iterations}${}${}",
        BASE64.encode(salt),
        BASE64.encode(derived)
    )
}

/// Checks a password against an encoded hash. Malformed hashes never
/// verify.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt), BASE64.decode(expected)) else {
        return false;
    };
    if iterations == 0 || expected.is_empty() {
        return false;
    }

    let mut derived = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);
    constant_time_eq(&derived, &expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("pw123", FAST);
        assert!(verify_password("pw123", &hash));
        assert!(!verify_password("wrongpw", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("pw123", FAST), hash_password("pw123", FAST));
    }

    #[test]
    fn encoded_form_records_iterations() {
        let hash = hash_password("pw123", FAST);
        assert!(hash.starts_with("pbkdf2-sha256$1000$"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("pw123", ""));
        assert!(!verify_password("pw123", "pw123"));
        assert!(!verify_password("pw123", "md5$1$abc$def"));
        assert!(!verify_password("pw123", "pbkdf2-sha256$x$AAAA$AAAA"));
        assert!(!verify_password("pw123", "pbkdf2-sha256$0$AAAA$AAAA"));
        assert!(!verify_password("pw123", "pbkdf2-sha256$1000$!!$AAAA"));
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
