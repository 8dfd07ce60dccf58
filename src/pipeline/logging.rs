/// Logging layer: innermost audit record of each call
use super::{BoxHandler, CallContext, Handler, Operation, OperationDescriptor};
use crate::error::AppResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Field names containing any of these (case-insensitive) are never logged
const SENSITIVE_MARKERS: &[&str] = &["password", "secret", "token", "salt", "hash", "captcha"];

const REDACTED: &str = "***";

pub struct LoggingLayer<O: Operation> {
    inner: BoxHandler<O>,
    descriptor: Arc<OperationDescriptor>,
}

impl<O: Operation> LoggingLayer<O> {
    pub fn new(inner: BoxHandler<O>, descriptor: Arc<OperationDescriptor>) -> Self {
        Self { inner, descriptor }
    }
}

fn is_sensitive(field: &str, extra: &[String]) -> bool {
    let lowered = field.to_lowercase();
    SENSITIVE_MARKERS.iter().any(|m| lowered.contains(m)) || extra.iter().any(|f| f == field)
}

/// Replace secret-bearing fields at every depth
pub fn redact(value: Value, extra: &[String]) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| {
                    if is_sensitive(&name, extra) {
                        (name, Value::String(REDACTED.to_string()))
                    } else {
                        (name, redact(value, extra))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| redact(v, extra)).collect()),
        other => other,
    }
}

/// Render request arguments for the log; never fails
pub fn render_arguments<T: serde::Serialize>(request: &T, extra: &[String]) -> String {
    match serde_json::to_value(request) {
        Ok(value) => redact(value, extra).to_string(),
        Err(_) => "<unserializable>".to_string(),
    }
}

#[async_trait]
impl<O: Operation> Handler<O> for LoggingLayer<O> {
    async fn handle(&self, call: &CallContext, request: O::Request) -> AppResult<O::Response> {
        let arguments = render_arguments(&request, &self.descriptor.sensitive_fields);

        let result = self.inner.handle(call, request).await;

        match &result {
            Ok(_) => info!(
                operation = %self.descriptor.name,
                request_id = %call.request_id,
                user_id = ?call.principal.user_id,
                arguments = %arguments,
                outcome = "success",
                "Operation completed"
            ),
            Err(e) => warn!(
                operation = %self.descriptor.name,
                request_id = %call.request_id,
                user_id = ?call.principal.user_id,
                arguments = %arguments,
                outcome = "failure",
                error_kind = e.kind(),
                "Operation failed: {}", e
            ),
        }

        result
    }
}
