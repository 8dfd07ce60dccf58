/// Static description of an operation type
use crate::error::{AppError, AppResult};
use std::time::Duration;

/// What the pipeline needs to know about an operation, declared once per
/// operation type.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    /// Operation name, also the cache key prefix
    pub name: String,
    /// Caller needs at least one of these; empty means no check
    pub required_permissions: Vec<String>,
    /// Cache successful results for this many minutes
    pub cache_duration: Option<u64>,
    /// Key patterns removed after a successful call
    pub invalidates: Vec<String>,
    /// Extra request fields never written to logs
    pub sensitive_fields: Vec<String>,
    /// Overrides the pipeline's slow-operation threshold
    pub slow_threshold: Option<Duration>,
    pub logging: bool,
    pub timing: bool,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_permissions: Vec::new(),
            cache_duration: None,
            invalidates: Vec::new(),
            sensitive_fields: Vec::new(),
            slow_threshold: None,
            logging: true,
            timing: true,
        }
    }

    pub fn require_permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permissions.push(permission.into());
        self
    }

    pub fn cache_for_minutes(mut self, minutes: u64) -> Self {
        self.cache_duration = Some(minutes);
        self
    }

    pub fn invalidates(mut self, pattern: impl Into<String>) -> Self {
        self.invalidates.push(pattern.into());
        self
    }

    pub fn sensitive(mut self, field: impl Into<String>) -> Self {
        self.sensitive_fields.push(field.into());
        self
    }

    pub fn slow_after(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    pub fn without_timing(mut self) -> Self {
        self.timing = false;
        self
    }

    pub fn requires_authorization(&self) -> bool {
        !self.required_permissions.is_empty()
    }

    pub fn touches_cache(&self) -> bool {
        self.cache_duration.is_some() || !self.invalidates.is_empty()
    }

    /// Reject descriptors that would produce ambiguous keys or checks
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_empty() {
            return Err(AppError::Validation(
                "Operation name cannot be empty".to_string(),
            ));
        }

        if self
            .name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '*' | '?'))
        {
            return Err(AppError::Validation(format!(
                "Operation name {:?} contains reserved characters",
                self.name
            )));
        }

        if self.cache_duration == Some(0) {
            return Err(AppError::Validation(format!(
                "{}: cache duration must be at least one minute",
                self.name
            )));
        }

        if self.required_permissions.iter().any(|p| p.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "{}: permission codes cannot be blank",
                self.name
            )));
        }

        if self.invalidates.iter().any(|p| p.is_empty()) {
            return Err(AppError::Validation(format!(
                "{}: invalidation patterns cannot be empty",
                self.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let descriptor = OperationDescriptor::new("GetExpenseCategories")
            .require_permission("ExpenseCategories.Read")
            .cache_for_minutes(10)
            .without_timing();

        assert_eq!(descriptor.name, "GetExpenseCategories");
        assert!(descriptor.requires_authorization());
        assert!(descriptor.touches_cache());
        assert_eq!(descriptor.cache_duration, Some(10));
        assert!(descriptor.logging);
        assert!(!descriptor.timing);
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_plain_descriptor_touches_nothing() {
        let descriptor = OperationDescriptor::new("Login");
        assert!(!descriptor.requires_authorization());
        assert!(!descriptor.touches_cache());
    }

    #[test]
    fn test_invalid_descriptors() {
        assert!(OperationDescriptor::new("").validate().is_err());
        assert!(OperationDescriptor::new("Get Things").validate().is_err());
        assert!(OperationDescriptor::new("Get(").validate().is_err());
        assert!(OperationDescriptor::new("Get*").validate().is_err());
        assert!(OperationDescriptor::new("Get")
            .cache_for_minutes(0)
            .validate()
            .is_err());
        assert!(OperationDescriptor::new("Get")
            .require_permission(" ")
            .validate()
            .is_err());
        assert!(OperationDescriptor::new("Add")
            .invalidates("")
            .validate()
            .is_err());
    }
}
