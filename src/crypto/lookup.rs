/// Deterministic lookup hashing
///
/// Sensitive identifiers (email addresses) are stored only as an unsalted
/// SHA-256 digest of their normalized form so exact-match lookups still work.
/// This is not a password hash: anyone able to query the lookup can confirm
/// guesses.

use sha2::{Digest, Sha256};

/// Normalize an identifier before hashing (trim + lowercase)
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Hash an identifier for equality-searchable storage.
///
/// Returns `None` for empty or whitespace-only input, otherwise the
/// uppercase hex SHA-256 digest of the normalized value.
pub fn hash_lookup_value(raw: &str) -> Option<String> {
    let normalized = normalize(raw)?;

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Some(hex::encode_upper(hasher.finalize()))
}
