//! Cached `GetExpenseCategories` observed through a counting repository

use async_trait::async_trait;
use pocketledger::auth::permissions::{ASSETS_READ, EXPENSE_CATEGORIES_READ};
use pocketledger::auth::Principal;
use pocketledger::cache::{CacheStore, MemoryCacheStore};
use pocketledger::db::Repository;
use pocketledger::error::{AppError, AppResult};
use pocketledger::finance::{ExpenseCategory, GetExpenseCategories, UserQuery};
use pocketledger::pipeline::{CallContext, Pipeline, PipelineSettings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// In-memory repository counting `find_all`, the only call the list handler makes
#[derive(Default)]
struct Counting {
    records: Mutex<Vec<ExpenseCategory>>,
    reads: AtomicUsize,
}

#[async_trait]
impl Repository<ExpenseCategory> for Counting {
    async fn get(&self, id: Uuid) -> AppResult<Option<ExpenseCategory>> {
        Ok(self.records.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<ExpenseCategory>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn add(&self, record: &ExpenseCategory) -> AppResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn save(&self, record: &ExpenseCategory) -> AppResult<()> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|c| c.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(record.id.to_string())),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn authorized_calls_hit_the_handler_once_per_ttl() {
    let user_id = Uuid::new_v4();
    let counting = Arc::new(Counting::default());
    counting
        .add(&ExpenseCategory {
            id: Uuid::new_v4(),
            user_id,
            name: "Groceries".to_string(),
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::default());
    let pipeline = Pipeline::new(Arc::clone(&cache), PipelineSettings::default());
    let operation = pipeline
        .register(GetExpenseCategories::new(
            Arc::clone(&counting) as Arc<dyn Repository<ExpenseCategory>>
        ))
        .unwrap();
    assert_eq!(operation.descriptor().cache_duration, Some(10));

    let authorized = CallContext::new(Principal::new(user_id, [EXPENSE_CATEGORIES_READ]));
    let unauthorized = CallContext::new(Principal::new(user_id, [ASSETS_READ]));

    // Denied before anything is cached or read
    let denied = operation
        .dispatch(&unauthorized, UserQuery::new(user_id))
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert_eq!(counting.reads.load(Ordering::SeqCst), 0);
    assert!(cache.is_empty());

    let first = operation
        .dispatch(&authorized, UserQuery::new(user_id))
        .await
        .unwrap();
    assert_eq!(counting.reads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);

    tokio::time::advance(Duration::from_secs(9 * 60)).await;
    let second = operation
        .dispatch(&authorized, UserQuery::new(user_id))
        .await
        .unwrap();
    assert_eq!(second, first);
    assert_eq!(counting.reads.load(Ordering::SeqCst), 1);

    // Denied even while a cached entry exists
    assert!(operation
        .dispatch(&unauthorized, UserQuery::new(user_id))
        .await
        .unwrap_err()
        .is_forbidden());
    assert_eq!(counting.reads.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(2 * 60)).await;
    operation
        .dispatch(&authorized, UserQuery::new(user_id))
        .await
        .unwrap();
    assert_eq!(counting.reads.load(Ordering::SeqCst), 2);
}
