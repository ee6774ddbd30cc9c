//! Password verification and policy.
//!
//! Hashing happens in the store when an identity is written; this
//! module only checks candidates against the stored PHC string.

pub use agencydesk_core::models::user::ensure_password_policy;
use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// The pepper, when configured, is prepended exactly as it was at
/// hashing time. Returns `Ok(false)` on mismatch and
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    // Parameters come from the PHC string, not from the default instance.
    match Argon2::default().verify_password(input, &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;

    /// Hash the way the store does: Argon2id, m=19456, t=2, p=1.
    fn store_hash(password: &str, pepper: Option<&str>) -> String {
        let params = argon2::Params::new(19456, 2, 1, None).unwrap();
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        let input = match pepper {
            Some(p) => format!("{p}{password}"),
            None => password.to_string(),
        };
        let salt = SaltString::generate(&mut OsRng);
        argon2.hash_password(input.as_bytes(), &salt).unwrap().to_string()
    }

    #[test]
    fn store_hash_verifies() {
        let hash = store_hash("open sesame", None);
        assert!(verify_password("open sesame", &hash, None).unwrap());
        assert!(!verify_password("open sesame!", &hash, None).unwrap());
    }

    #[test]
    fn pepper_must_match() {
        let hash = store_hash("open sesame", Some("pepper"));
        assert!(verify_password("open sesame", &hash, Some("pepper")).unwrap());
        assert!(!verify_password("open sesame", &hash, None).unwrap());
    }

    #[test]
    fn malformed_hash_is_a_crypto_error() {
        assert!(matches!(
            verify_password("pw", "not-a-hash", None),
            Err(AuthError::Crypto(_))
        ));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(ensure_password_policy("short", 8).is_err());
        assert!(ensure_password_policy("long enough", 8).is_ok());
    }
}
