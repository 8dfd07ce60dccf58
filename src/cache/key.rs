/// Cache key derivation
///
/// Keys look like `OperationName(arg1=v1,arg2=v2)`. Arguments come from the
/// request's serialized fields in sorted name order; each value is rendered
/// as JSON so separators inside strings cannot make two calls collide.

use crate::error::AppResult;
use serde::Serialize;
use serde_json::Value;

/// Ordered `(name, serialized value)` pairs for one call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentSignature(Vec<(String, String)>);

impl ArgumentSignature {
    /// Build the signature of a request value.
    ///
    /// Structs become one pair per field; unit requests have no arguments;
    /// any other value becomes a single `value` pair.
    pub fn from_request<T: Serialize>(request: &T) -> AppResult<Self> {
        let pairs = match serde_json::to_value(request)? {
            Value::Null => Vec::new(),
            // serde_json's default map is ordered by key
            Value::Object(fields) => fields
                .into_iter()
                .map(|(name, value)| (name, value.to_string()))
                .collect(),
            other => vec![("value".to_string(), other.to_string())],
        };
        Ok(Self(pairs))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// Render the cache key for an operation call
pub fn derive_cache_key(operation: &str, signature: &ArgumentSignature) -> String {
    let args = signature
        .0
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(",");
    format!("{}({})", operation, args)
}
