//! Error taxonomy shared across the repository core.
//!
//! The enum is `Clone` because the request-collapsing layer hands the same
//! rejection to every waiter of a shared in-flight call.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// One field-level problem found during seed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The full issue list for a record that failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", issue.path, issue.message)?;
        }
        Ok(())
    }
}

/// Well-typed rejections surfaced by the repository core.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// No candidate matched the requested root/file/predicate/publish-state
    /// combination. Never retried internally.
    #[error("not found: {0}")]
    NotFound(String),

    /// A candidate was found but failed schema validation.
    #[error("validation failed: {0}")]
    Validation(ValidationFailure),

    /// A cancellation signal fired during a delay or an awaited call.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other underlying failure, propagated unchanged through decorators.
    #[error("{0}")]
    Internal(Arc<anyhow::Error>),
}

impl CoreError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        CoreError::Internal(Arc::new(err.into()))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failure_joins_issues() {
        let failure = ValidationFailure {
            issues: vec![
                ValidationIssue::new("yono.power", "expected a number"),
                ValidationIssue::new("publishState", "unknown publish state `live`"),
            ],
        };
        assert_eq!(
            failure.to_string(),
            "yono.power: expected a number; publishState: unknown publish state `live`"
        );
    }

    #[test]
    fn internal_errors_keep_their_message() {
        let err = CoreError::internal(anyhow::anyhow!("upstream exploded"));
        assert_eq!(err.to_string(), "upstream exploded");
        assert!(!err.is_cancelled());
        let clone = err.clone();
        assert_eq!(clone.to_string(), err.to_string());
    }

    #[test]
    fn cancelled_is_distinguishable() {
        assert!(CoreError::Cancelled.is_cancelled());
        assert!(CoreError::NotFound("x".into()).is_not_found());
    }
}
