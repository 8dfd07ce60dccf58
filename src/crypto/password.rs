/// Salted password hashing
///
/// Each credential gets a fresh random salt which keys an HMAC-SHA512 over
/// the UTF-8 password. Verification recomputes the MAC and compares it in
/// constant time.

use crate::error::{AppError, AppResult};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::fmt;

type HmacSha512 = Hmac<Sha512>;

/// Salt length in bytes (one SHA-512 block, the HMAC key size)
pub const SALT_LEN: usize = 128;

/// Stored password credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredential {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

impl PasswordCredential {
    /// Check a password attempt against this credential
    pub fn verify(&self, password: &str) -> bool {
        verify_password(password, &self.hash, &self.salt)
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("hash", &"***")
            .field("salt", &"***")
            .finish()
    }
}

/// Hash a password with a freshly generated salt
pub fn hash_password(password: &str) -> AppResult<PasswordCredential> {
    if password.trim().is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }

    let mut salt = vec![0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut mac = HmacSha512::new_from_slice(&salt)
        .map_err(|e| AppError::Internal(format!("Failed to initialize HMAC: {}", e)))?;
    mac.update(password.as_bytes());
    let hash = mac.finalize().into_bytes().to_vec();

    Ok(PasswordCredential { hash, salt })
}

/// Verify a password against a stored hash and salt.
///
/// The full digest is always compared; timing does not depend on where the
/// first mismatching byte is.
pub fn verify_password(password: &str, hash: &[u8], salt: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha512::new_from_slice(salt) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let credential = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password(
            "correct horse battery staple",
            &credential.hash,
            &credential.salt
        ));
        assert!(credential.verify("correct horse battery staple"));
    }

    #[test]
    fn test_single_character_perturbations_fail() {
        let password = "s3cret-Pass";
        let credential = hash_password(password).unwrap();

        for (i, c) in password.char_indices() {
            let mut perturbed = password.to_string();
            let replacement = if c == 'x' { "y" } else { "x" };
            perturbed.replace_range(i..i + c.len_utf8(), replacement);
            assert!(!credential.verify(&perturbed), "accepted {}", perturbed);
        }

        assert!(!credential.verify("s3cret-Pas"));
        assert!(!credential.verify("s3cret-Passs"));
        assert!(!credential.verify("S3cret-Pass"));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(hash_password(""), Err(AppError::Validation(_))));
        assert!(matches!(hash_password("   "), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_salt_is_fresh_per_call() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_eq!(a.salt.len(), SALT_LEN);
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_hash_is_512_bits() {
        let credential = hash_password("password123").unwrap();
        assert_eq!(credential.hash.len(), 64);
    }

    #[test]
    fn test_wrong_salt_or_truncated_hash_fails() {
        let credential = hash_password("password123").unwrap();
        let other = hash_password("password123").unwrap();
        assert!(!verify_password("password123", &credential.hash, &other.salt));
        assert!(!verify_password(
            "password123",
            &credential.hash[..32],
            &credential.salt
        ));
        assert!(!verify_password("password123", &[], &credential.salt));
    }

    #[test]
    fn test_debug_hides_material() {
        let credential = hash_password("password123").unwrap();
        let rendered = format!("{:?}", credential);
        assert_eq!(
            rendered,
            "PasswordCredential { hash: \"***\", salt: \"***\" }"
        );
    }
}
