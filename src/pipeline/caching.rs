/// Caching layer: read-through for cached reads, invalidation for writes
use super::{BoxHandler, CallContext, Handler, Operation, OperationDescriptor};
use crate::cache::{derive_cache_key, ArgumentSignature, CacheStore, CacheStoreExt};
use crate::error::AppResult;
use crate::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache problems are logged and never fail the call. Concurrent misses on
/// the same key may both run the operation; the last write wins.
pub struct CachingLayer<O: Operation> {
    inner: BoxHandler<O>,
    descriptor: Arc<OperationDescriptor>,
    cache: Arc<dyn CacheStore>,
}

impl<O: Operation> CachingLayer<O> {
    pub fn new(
        inner: BoxHandler<O>,
        descriptor: Arc<OperationDescriptor>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            inner,
            descriptor,
            cache,
        }
    }

    fn cache_key(&self, request: &O::Request) -> Option<String> {
        self.descriptor.cache_duration?;

        match ArgumentSignature::from_request(request) {
            Ok(signature) => Some(derive_cache_key(&self.descriptor.name, &signature)),
            Err(e) => {
                warn!(
                    operation = %self.descriptor.name,
                    "Cannot derive cache key, bypassing cache: {}", e
                );
                None
            }
        }
    }

    fn store(&self, key: &str, response: &O::Response) {
        if let Err(e) = self
            .cache
            .add_typed(key, response, self.descriptor.cache_duration)
        {
            warn!(
                operation = %self.descriptor.name,
                "Failed to cache result: {}", e
            );
        }
    }

    fn invalidate(&self) {
        for pattern in &self.descriptor.invalidates {
            let removed = self.cache.remove_by_pattern(pattern);
            debug!(
                operation = %self.descriptor.name,
                pattern = %pattern,
                removed,
                "Invalidated cached results"
            );
            metrics::record_cache_invalidation(pattern, removed);
        }
    }
}

#[async_trait]
impl<O: Operation> Handler<O> for CachingLayer<O> {
    async fn handle(&self, call: &CallContext, request: O::Request) -> AppResult<O::Response> {
        let key = self.cache_key(&request);

        if let Some(key) = &key {
            if let Some(cached) = self.cache.get_typed::<O::Response>(key) {
                metrics::record_cache_access(&self.descriptor.name, true);
                return Ok(cached);
            }
            metrics::record_cache_access(&self.descriptor.name, false);
        }

        let response = self.inner.handle(call, request).await?;

        // Written only once the full result is in hand
        if let Some(key) = &key {
            self.store(key, &response);
        }
        self.invalidate();

        Ok(response)
    }
}
