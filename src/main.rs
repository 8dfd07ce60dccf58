/// Pocketledger - personal finance backend
///
/// Starts the operational listener (health and metrics) over a fully wired
/// application context.

use pocketledger::{config::AppConfig, context::AppContext, error::AppResult, server};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(config.logging.env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = %config.service.version,
        database = %config.storage.database_path.display(),
        captcha = config.captcha.enabled,
        "Starting Pocketledger"
    );

    // Create application context
    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await
}
