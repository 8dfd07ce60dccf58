/// Bearer tokens carrying permission claims
use super::Principal;
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// JWT claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
    #[serde(default)]
    permissions: Vec<String>,
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 access tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.token_issuer.clone(),
            ttl: Duration::minutes(config.access_token_ttl_minutes),
        }
    }

    /// Issue an access token for a user and their claims
    pub fn issue(&self, user_id: Uuid, permissions: &[String]) -> AppResult<AccessToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            permissions: permissions.to_vec(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(AccessToken { token, expires_at })
    }

    /// Resolve a bearer token into a principal
    pub fn resolve(&self, token: &str) -> AppResult<Principal> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.leeway = 0;

        let data = decode::<AccessClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!("Access token rejected: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Authentication("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::Authentication("Invalid token signature".to_string())
                }
                _ => AppError::Authentication("Invalid token".to_string()),
            }
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Authentication("Invalid token subject".to_string()))?;

        Ok(Principal::new(user_id, data.claims.permissions))
    }

    /// Resolve an optional `Authorization` header value.
    ///
    /// No header means an anonymous principal; a malformed or invalid one is
    /// an authentication error.
    pub fn resolve_header(&self, header: Option<&str>) -> AppResult<Principal> {
        let Some(header) = header else {
            return Ok(Principal::anonymous());
        };

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Expected a bearer token".to_string()))?;

        self.resolve(token.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            token_issuer: "pocketledger-test".to_string(),
            access_token_ttl_minutes: 30,
        }
    }

    #[test]
    fn test_issue_and_resolve() {
        let service = TokenService::new(&config());
        let user_id = Uuid::new_v4();
        let permissions = vec!["Assets.Read".to_string(), "Assets.Write".to_string()];

        let issued = service.issue(user_id, &permissions).unwrap();
        let principal = service.resolve(&issued.token).unwrap();

        assert_eq!(principal.user_id, Some(user_id));
        assert!(principal.has_claim("Assets.Read"));
        assert!(principal.has_claim("Assets.Write"));
        assert!(!principal.has_claim("Transactions.Read"));
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = TokenService::new(&config())
            .issue(Uuid::new_v4(), &[])
            .unwrap();

        let mut other = config();
        other.jwt_secret = "ffffffffffffffffffffffffffffffff".to_string();
        let result = TokenService::new(&other).resolve(&issued.token);
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issued = TokenService::new(&config())
            .issue(Uuid::new_v4(), &[])
            .unwrap();

        let mut other = config();
        other.token_issuer = "someone-else".to_string();
        assert!(TokenService::new(&other).resolve(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut expired = config();
        expired.access_token_ttl_minutes = -5;
        let service = TokenService::new(&expired);
        let issued = service.issue(Uuid::new_v4(), &[]).unwrap();

        match service.resolve(&issued.token) {
            Err(AppError::Authentication(message)) => assert!(message.contains("expired")),
            other => panic!("expected expiry error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_header() {
        let service = TokenService::new(&config());
        assert!(service.resolve_header(None).unwrap().is_anonymous());
        assert!(service.resolve_header(Some("Basic abc")).is_err());
        assert!(service.resolve_header(Some("Bearer not-a-jwt")).is_err());

        let user_id = Uuid::new_v4();
        let issued = service.issue(user_id, &[]).unwrap();
        let principal = service
            .resolve_header(Some(&format!("Bearer {}", issued.token)))
            .unwrap();
        assert_eq!(principal.user_id, Some(user_id));
    }
}
