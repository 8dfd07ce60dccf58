/// Authentication and authorization
///
/// - `Principal`: the caller's identity and permission claims
/// - Authorization gate: claim checks against an operation's requirements
/// - `TokenService`: bearer tokens carrying claims
/// - `TokenVerifier`: remote challenge-response (captcha) checks

pub mod captcha;
pub mod permissions;
pub mod tokens;

pub use captcha::{RecaptchaVerifier, TokenVerifier};
pub use tokens::{AccessToken, TokenService};

use crate::error::{AppError, AppResult};
use std::collections::HashSet;
use uuid::Uuid;

/// Authenticated caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Option<Uuid>,
    pub claims: HashSet<String>,
}

impl Principal {
    pub fn new<I, S>(user_id: Uuid, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: Some(user_id),
            claims: claims.into_iter().map(Into::into).collect(),
        }
    }

    /// Caller with no identity and no claims
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn has_claim(&self, claim: &str) -> bool {
        self.claims.contains(claim)
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

/// Check a principal against a set of required permissions.
///
/// An empty requirement always passes. Otherwise holding any one of the
/// required permissions is enough. Comparison is exact and case-sensitive;
/// there are no wildcards or hierarchies.
pub fn authorize(principal: &Principal, required: &[String]) -> Decision {
    if required.is_empty() || required.iter().any(|p| principal.has_claim(p)) {
        Decision::Allowed
    } else {
        Decision::Denied
    }
}

/// Like `authorize`, but a denial becomes `AppError::Forbidden`
pub fn enforce(principal: &Principal, required: &[String]) -> AppResult<()> {
    match authorize(principal, required) {
        Decision::Allowed => Ok(()),
        Decision::Denied => Err(AppError::Forbidden(format!(
            "Requires one of: {}",
            required.join(", ")
        ))),
    }
}

/// The caller may only act on records of its own account
pub fn enforce_owner(principal: &Principal, owner: Uuid) -> AppResult<()> {
    if principal.user_id == Some(owner) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Cannot access another user's records".to_string(),
        ))
    }
}
