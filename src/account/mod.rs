/// User accounts
///
/// Registration and login. Emails are stored only as lookup hashes; passwords
/// only as salted credentials.

mod login;
mod register;

pub use login::{Login, LoginRequest, LoginResponse};
pub use register::{RegisterUser, RegisterUserRequest, RegisteredUser};

use crate::crypto::{hash_lookup_value, PasswordCredential};
use crate::db::{Record, Repository};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Lookup hash of the normalized email
    pub email_hash: String,
    pub display_name: String,
    pub credential: PasswordCredential,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const KIND: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Lookup hash for an email address
pub(crate) fn email_lookup_hash(email: &str) -> AppResult<String> {
    hash_lookup_value(email)
        .ok_or_else(|| AppError::Validation("Email cannot be blank".to_string()))
}

/// Find a user by email lookup hash
pub(crate) async fn find_by_email_hash(
    users: &dyn Repository<User>,
    email_hash: &str,
) -> AppResult<Option<User>> {
    Ok(users
        .find_all()
        .await?
        .into_iter()
        .find(|u| u.email_hash == email_hash))
}
