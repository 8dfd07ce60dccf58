/// Credential hashing primitives
///
/// Salted password hashing for stored secrets and deterministic lookup
/// hashing for identifiers that must stay searchable by equality.

pub mod lookup;
pub mod password;

pub use lookup::hash_lookup_value;
pub use password::{hash_password, verify_password, PasswordCredential, SALT_LEN};
