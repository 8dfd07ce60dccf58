/// User registration
use super::{email_lookup_hash, find_by_email_hash, User};
use crate::auth::permissions::default_user_permissions;
use crate::auth::TokenVerifier;
use crate::crypto::hash_password;
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::pipeline::{Operation, OperationDescriptor};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    /// Required when captcha verification is enabled
    pub captcha_token: Option<String>,
    pub remote_addr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub user_id: Uuid,
    pub display_name: String,
    pub permissions: Vec<String>,
}

pub struct RegisterUser {
    users: Arc<dyn Repository<User>>,
    captcha: Option<Arc<dyn TokenVerifier>>,
}

impl RegisterUser {
    /// `captcha` of `None` disables the challenge check
    pub fn new(users: Arc<dyn Repository<User>>, captcha: Option<Arc<dyn TokenVerifier>>) -> Self {
        Self { users, captcha }
    }

    async fn check_captcha(&self, request: &RegisterUserRequest) -> AppResult<()> {
        let Some(verifier) = &self.captcha else {
            return Ok(());
        };

        let token = request.captcha_token.as_deref().unwrap_or_default();
        if verifier.verify(token, request.remote_addr.as_deref()).await {
            Ok(())
        } else {
            warn!("Registration rejected: captcha not verified");
            Err(AppError::Authentication(
                "Captcha verification failed".to_string(),
            ))
        }
    }
}

#[async_trait]
impl Operation for RegisterUser {
    type Request = RegisterUserRequest;
    type Response = RegisteredUser;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("RegisterUser")
            .sensitive("email")
            .sensitive("remote_addr")
    }

    async fn execute(&self, request: RegisterUserRequest) -> AppResult<RegisteredUser> {
        request.validate()?;
        self.check_captcha(&request).await?;

        let email_hash = email_lookup_hash(&request.email)?;
        if find_by_email_hash(self.users.as_ref(), &email_hash)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let display_name = crate::finance::normalize_name(&request.display_name)?;
        let user = User {
            id: Uuid::new_v4(),
            email_hash,
            display_name,
            credential: hash_password(&request.password)?,
            permissions: default_user_permissions(),
            created_at: Utc::now(),
        };
        self.users.add(&user).await?;

        info!(user_id = %user.id, "Registered user");

        Ok(RegisteredUser {
            user_id: user.id,
            display_name: user.display_name,
            permissions: user.permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, SqliteRepository};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts exactly one token value and counts calls
    struct FixedVerifier {
        accepted: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenVerifier for FixedVerifier {
        async fn verify(&self, token: &str, _remote_addr: Option<&str>) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            token == self.accepted
        }
    }

    fn request(email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            email: email.to_string(),
            display_name: "Ada".to_string(),
            password: "correct horse".to_string(),
            captcha_token: None,
            remote_addr: None,
        }
    }

    async fn users() -> Arc<dyn Repository<User>> {
        Arc::new(SqliteRepository::<User>::new(test_pool().await))
    }

    #[tokio::test]
    async fn test_register_stores_hashed_identity() {
        let users = users().await;
        let register = RegisterUser::new(Arc::clone(&users), None);

        let registered = register.execute(request("ada@example.com")).await.unwrap();
        assert_eq!(registered.permissions, default_user_permissions());

        let stored = users.get(registered.user_id).await.unwrap().unwrap();
        assert_ne!(stored.email_hash, "ada@example.com");
        assert_eq!(stored.email_hash.len(), 64);
        assert!(stored.credential.verify("correct horse"));
        assert!(!stored.credential.verify("wrong horse"));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_case_insensitively() {
        let register = RegisterUser::new(users().await, None);
        register.execute(request("ada@example.com")).await.unwrap();

        let result = register.execute(request("ADA@Example.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let register = RegisterUser::new(users().await, None);

        assert!(matches!(
            register.execute(request("not-an-email")).await,
            Err(AppError::Validation(_))
        ));

        let mut short = request("ada@example.com");
        short.password = "short".to_string();
        assert!(matches!(
            register.execute(short).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_captcha_gate() {
        let verifier = Arc::new(FixedVerifier {
            accepted: "good-token",
            calls: AtomicUsize::new(0),
        });
        let users = users().await;
        let register = RegisterUser::new(
            Arc::clone(&users),
            Some(Arc::clone(&verifier) as Arc<dyn TokenVerifier>),
        );

        let result = register.execute(request("ada@example.com")).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));

        let mut bad = request("ada@example.com");
        bad.captcha_token = Some("bad-token".to_string());
        assert!(register.execute(bad).await.is_err());
        assert!(users.find_all().await.unwrap().is_empty());

        let mut good = request("ada@example.com");
        good.captcha_token = Some("good-token".to_string());
        register.execute(good).await.unwrap();
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 3);
    }
}
