//! Shared fixtures for integration tests

use pocketledger::auth::TokenVerifier;
use pocketledger::config::{
    AppConfig, AuthConfig, CacheConfig, CaptchaConfig, LoggingConfig, PerformanceConfig,
    ServiceConfig, StorageConfig,
};
use pocketledger::context::AppContext;
use pocketledger::db;
use std::path::PathBuf;
use std::sync::Arc;

pub fn config() -> AppConfig {
    AppConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            version: "test".to_string(),
        },
        storage: StorageConfig {
            database_path: PathBuf::from(":memory:"),
        },
        cache: CacheConfig::default(),
        performance: PerformanceConfig {
            slow_operation_threshold_secs: 5,
        },
        authentication: AuthConfig {
            jwt_secret: "integration-secret-integration-secret".to_string(),
            token_issuer: "pocketledger-it".to_string(),
            access_token_ttl_minutes: 15,
        },
        captcha: CaptchaConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

/// Context over a migrated in-memory database
pub async fn context(captcha: Option<Arc<dyn TokenVerifier>>) -> AppContext {
    let pool = db::create_memory_pool().await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    AppContext::build(config(), pool, captcha).unwrap()
}
