/// Configuration management for Pocketledger
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_LOG_FILTER: &str = "pocketledger=debug,tower_http=info";

/// Default reCAPTCHA verification endpoint
pub const DEFAULT_CAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub performance: PerformanceConfig,
    pub authentication: AuthConfig,
    pub captcha: CaptchaConfig,
    pub logging: LoggingConfig,
}

/// Operational listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

/// Cache store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound applied to every entry's TTL, including entries added
    /// without a duration. `None` keeps such entries until removed.
    pub max_ttl_minutes: Option<u64>,
}

/// Performance timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub slow_operation_threshold_secs: u64,
}

impl PerformanceConfig {
    pub fn slow_operation_threshold(&self) -> Duration {
        Duration::from_secs(self.slow_operation_threshold_secs)
    }
}

/// Authentication configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_issuer: String,
    pub access_token_ttl_minutes: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("token_issuer", &self.token_issuer)
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .finish()
    }
}

/// Challenge-response (captcha) verification configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    pub enabled: bool,
    pub secret: String,
    pub verify_url: String,
    pub timeout_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret: String::new(),
            verify_url: DEFAULT_CAPTCHA_VERIFY_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("enabled", &self.enabled)
            .field("secret", &"***")
            .field("verify_url", &self.verify_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    /// Build the subscriber filter from the configured directives
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("LEDGER_HOSTNAME").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("LEDGER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let version = env!("CARGO_PKG_VERSION").to_string();

        let database_path = env::var("LEDGER_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/ledger.sqlite"));

        // Unset or zero means no ceiling
        let max_ttl_minutes = env::var("LEDGER_CACHE_MAX_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0);

        let slow_operation_threshold_secs = env::var("LEDGER_SLOW_OPERATION_THRESHOLD_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let jwt_secret = env::var("LEDGER_JWT_SECRET")
            .map_err(|_| AppError::Validation("JWT secret required".to_string()))?;
        let token_issuer =
            env::var("LEDGER_TOKEN_ISSUER").unwrap_or_else(|_| "pocketledger".to_string());
        let access_token_ttl_minutes = env::var("LEDGER_ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let captcha_enabled = env::var("LEDGER_CAPTCHA_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);
        let captcha_secret = env::var("LEDGER_CAPTCHA_SECRET").unwrap_or_default();
        let captcha_verify_url = env::var("LEDGER_CAPTCHA_VERIFY_URL")
            .unwrap_or_else(|_| DEFAULT_CAPTCHA_VERIFY_URL.to_string());
        let captcha_timeout_secs = env::var("LEDGER_CAPTCHA_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Ok(AppConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig { database_path },
            cache: CacheConfig { max_ttl_minutes },
            performance: PerformanceConfig {
                slow_operation_threshold_secs,
            },
            authentication: AuthConfig {
                jwt_secret,
                token_issuer,
                access_token_ttl_minutes,
            },
            captcha: CaptchaConfig {
                enabled: captcha_enabled,
                secret: captcha_secret,
                verify_url: captcha_verify_url,
                timeout_secs: captcha_timeout_secs,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(AppError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.access_token_ttl_minutes <= 0 {
            return Err(AppError::Validation(
                "Access token TTL must be positive".to_string(),
            ));
        }

        if self.captcha.enabled && self.captcha.secret.trim().is_empty() {
            return Err(AppError::Validation(
                "Captcha secret required when captcha is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
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
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            token_issuer: "pocketledger-test".to_string(),
            access_token_ttl_minutes: 60,
        },
        captcha: CaptchaConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}
