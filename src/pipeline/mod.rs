/// Operation interceptor pipeline
///
/// Every business operation is registered once and wrapped in a fixed chain
/// of layers, outermost first:
///
/// 1. authorization (claims, and ownership of the records touched)
/// 2. caching (read-through for cached reads, invalidation for writes)
/// 3. timing
/// 4. logging
///
/// Layers are plain boxed handlers composed at registration time; the
/// operation itself never sees them.

pub mod authorization;
pub mod caching;
pub mod descriptor;
pub mod logging;
pub mod timing;

pub use descriptor::OperationDescriptor;

use crate::auth::Principal;
use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::error::AppResult;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use authorization::AuthorizationLayer;
use caching::CachingLayer;
use logging::LoggingLayer;
use timing::TimingLayer;

/// A business command or query
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    type Request: Serialize + Send + Sync + 'static;
    type Response: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn descriptor() -> OperationDescriptor;

    /// Account the request acts on. When present, only that user may call.
    fn owner(_request: &Self::Request) -> Option<Uuid> {
        None
    }

    async fn execute(&self, request: Self::Request) -> AppResult<Self::Response>;
}

/// Per-call context passed through every layer
#[derive(Debug, Clone)]
pub struct CallContext {
    pub principal: Principal,
    pub request_id: Uuid,
}

impl CallContext {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(Principal::anonymous())
    }
}

/// One link in an operation's chain
#[async_trait]
pub trait Handler<O: Operation>: Send + Sync {
    async fn handle(&self, call: &CallContext, request: O::Request) -> AppResult<O::Response>;
}

pub type BoxHandler<O> = Box<dyn Handler<O>>;

/// Innermost link: runs the operation
struct Execute<O> {
    operation: Arc<O>,
}

#[async_trait]
impl<O: Operation> Handler<O> for Execute<O> {
    async fn handle(&self, _call: &CallContext, request: O::Request) -> AppResult<O::Response> {
        self.operation.execute(request).await
    }
}

/// Pipeline-wide settings
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub slow_operation_threshold: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            slow_operation_threshold: Duration::from_secs(5),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            slow_operation_threshold: config.performance.slow_operation_threshold(),
        }
    }
}

/// Builds dispatchers around operations, sharing one cache store
#[derive(Clone)]
pub struct Pipeline {
    cache: Arc<dyn CacheStore>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(cache: Arc<dyn CacheStore>, settings: PipelineSettings) -> Self {
        Self { cache, settings }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Validate the operation's descriptor and compose its chain
    pub fn register<O: Operation>(&self, operation: O) -> AppResult<Dispatcher<O>> {
        let descriptor = Arc::new(O::descriptor());
        descriptor.validate()?;

        let mut handler: BoxHandler<O> = Box::new(Execute {
            operation: Arc::new(operation),
        });

        if descriptor.logging {
            handler = Box::new(LoggingLayer::new(handler, Arc::clone(&descriptor)));
        }

        if descriptor.timing {
            let threshold = descriptor
                .slow_threshold
                .unwrap_or(self.settings.slow_operation_threshold);
            handler = Box::new(TimingLayer::new(handler, Arc::clone(&descriptor), threshold));
        }

        if descriptor.touches_cache() {
            handler = Box::new(CachingLayer::new(
                handler,
                Arc::clone(&descriptor),
                Arc::clone(&self.cache),
            ));
        }

        // Always outermost; ownership is decided per request
        handler = Box::new(AuthorizationLayer::new(handler, Arc::clone(&descriptor)));

        debug!(
            operation = %descriptor.name,
            authorization = descriptor.requires_authorization(),
            cache_minutes = ?descriptor.cache_duration,
            timing = descriptor.timing,
            logging = descriptor.logging,
            "Registered operation"
        );

        Ok(Dispatcher {
            handler,
            descriptor,
        })
    }
}

/// A registered operation with its chain applied
pub struct Dispatcher<O: Operation> {
    handler: BoxHandler<O>,
    descriptor: Arc<OperationDescriptor>,
}

impl<O: Operation> Dispatcher<O> {
    pub async fn dispatch(
        &self,
        call: &CallContext,
        request: O::Request,
    ) -> AppResult<O::Response> {
        self.handler.handle(call, request).await
    }

    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::AppError;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct EchoRequest {
        pub user_id: u32,
        pub fail: bool,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct EchoResponse {
        pub user_id: u32,
        pub call: usize,
    }

    /// Counts executions; the descriptor comes from a thread-local so each
    /// test can shape its own chain.
    pub struct Echo {
        pub calls: Arc<AtomicUsize>,
    }

    thread_local! {
        pub static DESCRIPTOR: std::cell::RefCell<OperationDescriptor> =
            std::cell::RefCell::new(OperationDescriptor::new("Echo"));
    }

    pub fn with_descriptor(descriptor: OperationDescriptor) {
        DESCRIPTOR.with(|d| *d.borrow_mut() = descriptor);
    }

    #[async_trait]
    impl Operation for Echo {
        type Request = EchoRequest;
        type Response = EchoResponse;

        fn descriptor() -> OperationDescriptor {
            DESCRIPTOR.with(|d| d.borrow().clone())
        }

        async fn execute(&self, request: EchoRequest) -> AppResult<EchoResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if request.fail {
                return Err(AppError::NotFound("echo failed".to_string()));
            }
            Ok(EchoResponse {
                user_id: request.user_id,
                call,
            })
        }
    }
}
