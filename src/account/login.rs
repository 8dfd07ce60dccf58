/// Password login
use super::{email_lookup_hash, find_by_email_hash, User};
use crate::auth::{AccessToken, TokenService};
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::pipeline::{Operation, OperationDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub access_token: AccessToken,
}

pub struct Login {
    users: Arc<dyn Repository<User>>,
    tokens: TokenService,
}

impl Login {
    pub fn new(users: Arc<dyn Repository<User>>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }
}

fn invalid_credentials() -> AppError {
    AppError::Authentication("Invalid email or password".to_string())
}

#[async_trait]
impl Operation for Login {
    type Request = LoginRequest;
    type Response = LoginResponse;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("Login").sensitive("email")
    }

    async fn execute(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let email_hash = email_lookup_hash(&request.email).map_err(|_| invalid_credentials())?;

        let Some(user) = find_by_email_hash(self.users.as_ref(), &email_hash).await? else {
            debug!("Login for unknown email");
            return Err(invalid_credentials());
        };

        if !user.credential.verify(&request.password) {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(invalid_credentials());
        }

        let access_token = self.tokens.issue(user.id, &user.permissions)?;

        Ok(LoginResponse {
            user_id: user.id,
            access_token,
        })
    }
}
