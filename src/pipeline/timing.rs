/// Performance timing layer
use super::{BoxHandler, CallContext, Handler, Operation, OperationDescriptor};
use crate::error::AppResult;
use crate::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Measures wall-clock time of the inner chain and flags slow calls.
/// The result passes through untouched.
pub struct TimingLayer<O: Operation> {
    inner: BoxHandler<O>,
    descriptor: Arc<OperationDescriptor>,
    threshold: Duration,
}

impl<O: Operation> TimingLayer<O> {
    pub fn new(inner: BoxHandler<O>, descriptor: Arc<OperationDescriptor>, threshold: Duration) -> Self {
        Self {
            inner,
            descriptor,
            threshold,
        }
    }
}

#[async_trait]
impl<O: Operation> Handler<O> for TimingLayer<O> {
    async fn handle(&self, call: &CallContext, request: O::Request) -> AppResult<O::Response> {
        let started = Instant::now();
        let result = self.inner.handle(call, request).await;
        let elapsed = started.elapsed();

        metrics::record_operation(&self.descriptor.name, result.is_ok(), elapsed.as_secs_f64());

        if elapsed > self.threshold {
            warn!(
                operation = %self.descriptor.name,
                request_id = %call.request_id,
                elapsed_secs = elapsed.as_secs_f64(),
                threshold_secs = self.threshold.as_secs_f64(),
                "Slow operation"
            );
            metrics::record_slow_operation(&self.descriptor.name);
        }

        result
    }
}
