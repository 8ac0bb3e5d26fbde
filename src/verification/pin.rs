//! PIN hashing and constant-time verification.
//!
//! Stored hashes have the form `sha256$<salt-hex>$<digest-hex>` where the
//! digest is SHA-256 over the salt bytes followed by the PIN's UTF-8 bytes.
//!
//! A single salted hash over a short numeric PIN can be searched exhaustively
//! by anyone holding the stored value, so stored hashes must be kept as
//! confidential as the PINs themselves.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::{EngineError, EngineResult};

const SCHEME: &str = "sha256";

/// Shortest accepted PIN.
pub const MIN_PIN_LENGTH: usize = 4;

/// Longest accepted PIN.
pub const MAX_PIN_LENGTH: usize = 12;

/// Checks that a PIN is 4 to 12 ASCII digits.
pub fn validate_pin(pin: &str) -> EngineResult<()> {
    if !(MIN_PIN_LENGTH..=MAX_PIN_LENGTH).contains(&pin.len()) {
        return Err(EngineError::validation(
            "pin",
            format!(
                "must be {} to {} digits",
                MIN_PIN_LENGTH, MAX_PIN_LENGTH
            ),
        ));
    }
    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::validation("pin", "must contain only digits"));
    }
    Ok(())
}

fn digest(salt: &[u8], pin: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(pin.as_bytes());
    hasher.finalize().into()
}

/// Hashes a PIN with the given salt into the stored format.
///
/// # Example
///
/// ```
/// use attendance_engine::verification::{hash_pin, verify_pin};
///
/// let stored = hash_pin("4821", b"0123456789abcdef")?;
/// assert!(stored.starts_with("sha256$"));
/// assert!(verify_pin(&stored, "4821").is_ok());
/// assert!(verify_pin(&stored, "0000").is_err());
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
pub fn hash_pin(pin: &str, salt: &[u8]) -> EngineResult<String> {
    validate_pin(pin)?;
    if salt.is_empty() {
        return Err(EngineError::validation("salt", "must not be empty"));
    }
    Ok(format!(
        "{}${}${}",
        SCHEME,
        hex::encode(salt),
        hex::encode(digest(salt, pin))
    ))
}

/// Verifies a PIN against a stored hash in constant time.
///
/// # Errors
///
/// Returns [`EngineError::InvalidCredential`] if the PIN does not match or
/// the stored hash is unreadable.
pub fn verify_pin(stored: &str, pin: &str) -> EngineResult<()> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(salt_hex), Some(digest_hex), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        warn!("Stored PIN hash is malformed");
        return Err(EngineError::InvalidCredential);
    };
    if scheme != SCHEME {
        warn!(scheme = %scheme, "Unsupported PIN hash scheme");
        return Err(EngineError::InvalidCredential);
    }
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        warn!("Stored PIN hash is not valid hex");
        return Err(EngineError::InvalidCredential);
    };

    let actual = digest(&salt, pin);
    if expected.len() == actual.len() && bool::from(actual[..].ct_eq(&expected[..])) {
        Ok(())
    } else {
        Err(EngineError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // From config/seed.yaml (PIN 4821).
    const SEEDED: &str = "sha256$a1b2c3d4e5f60718$854be010d16a21123677cedaad938b0a1bae4e9ebb6608d016c678033675b8f1";

    #[test]
    fn test_seeded_hash_verifies() {
        assert!(verify_pin(SEEDED, "4821").is_ok());
    }

    #[test]
    fn test_wrong_pin_is_invalid_credential() {
        assert!(matches!(
            verify_pin(SEEDED, "4822"),
            Err(EngineError::InvalidCredential)
        ));
    }

    #[test]
    fn test_hash_then_verify() {
        let stored = hash_pin("135790", &[7u8; 16]).unwrap();
        assert!(verify_pin(&stored, "135790").is_ok());
        assert!(verify_pin(&stored, "135791").is_err());
    }

    #[test]
    fn test_same_pin_different_salt_differs() {
        let a = hash_pin("2468", b"salt-a").unwrap();
        let b = hash_pin("2468", b"salt-b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_stored_hash_is_invalid_credential() {
        for stored in ["", "plain", "md5$00$00", "sha256$zz$00", "sha256$00$00$00"] {
            assert!(
                matches!(verify_pin(stored, "4821"), Err(EngineError::InvalidCredential)),
                "expected InvalidCredential for {:?}",
                stored
            );
        }
    }

    #[test]
    fn test_truncated_digest_is_rejected() {
        let truncated = &SEEDED[..SEEDED.len() - 2];
        assert!(verify_pin(truncated, "4821").is_err());
    }

    #[test]
    fn test_validate_pin() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("1234567890123").is_err());
        assert!(validate_pin("12a4").is_err());
    }
}
