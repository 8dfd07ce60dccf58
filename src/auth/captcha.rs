/// Remote challenge-response (captcha) verification
///
/// Any failure on the way (transport error, timeout, non-success status,
/// unparseable body) counts as a rejected token. Callers cannot tell a
/// verifier outage from a "no"; retry policy belongs above this boundary.

use crate::config::CaptchaConfig;
use crate::error::{AppError, AppResult};
use crate::metrics;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Verifies a challenge-response token with a remote service
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_addr: Option<&str>) -> bool;
}

/// Verification endpoint response
#[derive(Debug, Deserialize)]
struct VerificationResponse {
    success: bool,
    #[serde(default)]
    challenge_ts: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// reCAPTCHA-style verifier posting `{secret, response, remoteip}`
#[derive(Clone)]
pub struct RecaptchaVerifier {
    http_client: Client,
    verify_url: String,
    secret: String,
}

impl RecaptchaVerifier {
    pub fn new(config: &CaptchaConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            verify_url: config.verify_url.clone(),
            secret: config.secret.clone(),
        })
    }

    /// Use a caller-supplied client (custom timeouts, proxies)
    pub fn with_client(http_client: Client, verify_url: String, secret: String) -> Self {
        Self {
            http_client,
            verify_url,
            secret,
        }
    }

    async fn request(&self, token: &str, remote_addr: Option<&str>) -> Option<VerificationResponse> {
        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(addr) = remote_addr {
            form.push(("remoteip", addr));
        }

        // Errors are logged without the request so the secret never reaches the log
        let response = match self.http_client.post(&self.verify_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                let timed_out = e.is_timeout();
                let e = e.without_url();
                warn!(
                    timeout = timed_out,
                    "Captcha verification request failed: {}", e
                );
                metrics::record_captcha_verification("unavailable");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Captcha verification endpoint returned status {}",
                response.status()
            );
            metrics::record_captcha_verification("unavailable");
            return None;
        }

        match response.json::<VerificationResponse>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Invalid captcha verification response: {}", e.without_url());
                metrics::record_captcha_verification("malformed");
                None
            }
        }
    }
}

#[async_trait]
impl TokenVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, remote_addr: Option<&str>) -> bool {
        if token.trim().is_empty() {
            debug!("Empty captcha token rejected");
            metrics::record_captcha_verification("rejected");
            return false;
        }

        let Some(body) = self.request(token, remote_addr).await else {
            return false;
        };

        if body.success {
            debug!(
                hostname = body.hostname.as_deref().unwrap_or("-"),
                challenge_ts = body.challenge_ts.as_deref().unwrap_or("-"),
                "Captcha verified"
            );
            metrics::record_captcha_verification("accepted");
        } else {
            debug!(error_codes = ?body.error_codes, "Captcha rejected");
            metrics::record_captcha_verification("rejected");
        }

        body.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body: VerificationResponse = serde_json::from_str(
            r#"{"success": false, "error-codes": ["invalid-input-response"]}"#,
        )
        .unwrap();
        assert!(!body.success);
        assert_eq!(body.error_codes, vec!["invalid-input-response".to_string()]);

        let body: VerificationResponse = serde_json::from_str(
            r#"{"success": true, "challenge_ts": "2024-01-01T00:00:00Z", "hostname": "ledger.example"}"#,
        )
        .unwrap();
        assert!(body.success);
        assert_eq!(body.hostname.as_deref(), Some("ledger.example"));
    }

    #[tokio::test]
    async fn test_blank_token_rejected_without_network() {
        let verifier = RecaptchaVerifier::new(&CaptchaConfig {
            enabled: true,
            secret: "s".to_string(),
            // Unroutable; a request here would fail anyway
            verify_url: "http://127.0.0.1:9/siteverify".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        assert!(!verifier.verify("   ", None).await);
    }
}
