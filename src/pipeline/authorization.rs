/// Authorization layer: the outermost gate
use super::{BoxHandler, CallContext, Handler, Operation, OperationDescriptor};
use crate::auth;
use crate::error::AppResult;
use crate::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub struct AuthorizationLayer<O: Operation> {
    inner: BoxHandler<O>,
    descriptor: Arc<OperationDescriptor>,
}

impl<O: Operation> AuthorizationLayer<O> {
    pub fn new(inner: BoxHandler<O>, descriptor: Arc<OperationDescriptor>) -> Self {
        Self { inner, descriptor }
    }
}

#[async_trait]
impl<O: Operation> Handler<O> for AuthorizationLayer<O> {
    async fn handle(&self, call: &CallContext, request: O::Request) -> AppResult<O::Response> {
        let checked = auth::enforce(&call.principal, &self.descriptor.required_permissions).and_then(
            |()| match O::owner(&request) {
                Some(owner) => auth::enforce_owner(&call.principal, owner),
                None => Ok(()),
            },
        );

        if let Err(denied) = checked {
            warn!(
                operation = %self.descriptor.name,
                request_id = %call.request_id,
                user_id = ?call.principal.user_id,
                "Authorization denied: {}", denied
            );
            metrics::record_authorization_denial(&self.descriptor.name);
            return Err(denied);
        }

        self.inner.handle(call, request).await
    }
}
