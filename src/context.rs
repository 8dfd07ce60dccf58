/// Application context and dependency injection
use crate::{
    account::{Login, RegisterUser, User},
    auth::{RecaptchaVerifier, TokenService, TokenVerifier},
    cache::{CacheStore, MemoryCacheStore},
    config::AppConfig,
    db::{self, Repository, SqliteRepository},
    error::AppResult,
    finance::{
        AddAsset, AddExpenseCategory, AddIncomeCategory, AddTransaction, Asset, ExpenseCategory,
        GetAssets, GetExpenseCategories, GetIncomeCategories, GetTransactions, IncomeCategory,
        Transaction,
    },
    pipeline::{CallContext, Dispatcher, Pipeline, PipelineSettings},
};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One dispatcher per registered operation
pub struct Operations {
    pub get_expense_categories: Dispatcher<GetExpenseCategories>,
    pub add_expense_category: Dispatcher<AddExpenseCategory>,
    pub get_income_categories: Dispatcher<GetIncomeCategories>,
    pub add_income_category: Dispatcher<AddIncomeCategory>,
    pub get_transactions: Dispatcher<GetTransactions>,
    pub add_transaction: Dispatcher<AddTransaction>,
    pub get_assets: Dispatcher<GetAssets>,
    pub add_asset: Dispatcher<AddAsset>,
    pub register_user: Dispatcher<RegisterUser>,
    pub login: Dispatcher<Login>,
}

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub cache: Arc<dyn CacheStore>,
    pub pipeline: Pipeline,
    pub tokens: TokenService,
    pub captcha: Option<Arc<dyn TokenVerifier>>,
    pub operations: Arc<Operations>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        // Validate configuration
        config.validate()?;

        let db = if config.storage.database_path == Path::new(":memory:") {
            db::create_memory_pool().await?
        } else {
            db::create_pool(&config.storage.database_path, db::DatabaseOptions::default()).await?
        };
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let captcha: Option<Arc<dyn TokenVerifier>> = if config.captcha.enabled {
            info!("Captcha verification enabled for registration");
            Some(Arc::new(RecaptchaVerifier::new(&config.captcha)?))
        } else {
            None
        };

        Self::build(config, db, captcha)
    }

    /// Wire the context over an already migrated pool and a chosen verifier
    pub fn build(
        config: AppConfig,
        db: SqlitePool,
        captcha: Option<Arc<dyn TokenVerifier>>,
    ) -> AppResult<Self> {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new(&config.cache));
        let pipeline = Pipeline::new(Arc::clone(&cache), PipelineSettings::from_config(&config));
        let tokens = TokenService::new(&config.authentication);

        let users: Arc<dyn Repository<User>> = Arc::new(SqliteRepository::<User>::new(db.clone()));
        let expense_categories: Arc<dyn Repository<ExpenseCategory>> =
            Arc::new(SqliteRepository::<ExpenseCategory>::new(db.clone()));
        let income_categories: Arc<dyn Repository<IncomeCategory>> =
            Arc::new(SqliteRepository::<IncomeCategory>::new(db.clone()));
        let transactions: Arc<dyn Repository<Transaction>> =
            Arc::new(SqliteRepository::<Transaction>::new(db.clone()));
        let assets: Arc<dyn Repository<Asset>> = Arc::new(SqliteRepository::<Asset>::new(db.clone()));

        let operations = Operations {
            get_expense_categories: pipeline
                .register(GetExpenseCategories::new(Arc::clone(&expense_categories)))?,
            add_expense_category: pipeline
                .register(AddExpenseCategory::new(Arc::clone(&expense_categories)))?,
            get_income_categories: pipeline
                .register(GetIncomeCategories::new(Arc::clone(&income_categories)))?,
            add_income_category: pipeline
                .register(AddIncomeCategory::new(Arc::clone(&income_categories)))?,
            get_transactions: pipeline.register(GetTransactions::new(Arc::clone(&transactions)))?,
            add_transaction: pipeline.register(AddTransaction::new(
                transactions,
                expense_categories,
                income_categories,
            ))?,
            get_assets: pipeline.register(GetAssets::new(Arc::clone(&assets)))?,
            add_asset: pipeline.register(AddAsset::new(assets))?,
            register_user: pipeline.register(RegisterUser::new(Arc::clone(&users), captcha.clone()))?,
            login: pipeline.register(Login::new(users, tokens.clone()))?,
        };

        Ok(Self {
            config: Arc::new(config),
            db,
            cache,
            pipeline,
            tokens,
            captcha,
            operations: Arc::new(operations),
        })
    }

    /// Build the per-call context from an optional `Authorization` header
    pub fn call_context(&self, authorization: Option<&str>) -> AppResult<CallContext> {
        let principal = self.tokens.resolve_header(authorization)?;
        Ok(CallContext::new(principal))
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
