//! Masking error types
//!
//! All errors are domain-specific and don't expose third-party types.
//! `MaskError` is `Clone` so a failed descriptor resolution can be cached and
//! replayed to subsequent callers without re-resolving.

use thiserror::Error;

/// Errors surfaced by the masking engine.
///
/// Resolution-time errors (`UnknownStrategy`, `InvalidDescriptor`,
/// `InvalidCondition`) abort compiling a type's descriptors and are cached,
/// so misconfiguration surfaces early and once. Dispatch-time errors
/// (`RecursionLimitExceeded`) abort only the single `mask()` call and leave
/// registry and cache state untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MaskError {
    /// A declared strategy id is not registered
    #[error("unknown masking strategy '{0}'")]
    UnknownStrategy(String),

    /// A field declaration is malformed or its parameters failed validation
    #[error("invalid descriptor ({context}): {reason}")]
    InvalidDescriptor { context: String, reason: String },

    /// A declared condition could not be compiled
    #[error("invalid condition on field '{field}': {reason}")]
    InvalidCondition { field: String, reason: String },

    /// Nested masking exceeded the engine's depth guard
    #[error("recursion limit of {limit} exceeded while masking type '{type_name}'")]
    RecursionLimitExceeded { type_name: String, limit: usize },

    /// No masking declaration is registered for the requested type
    #[error("no masking declaration registered for type '{0}'")]
    UnknownType(String),

    /// A declaration table could not be loaded or parsed
    #[error("declaration error: {0}")]
    Declaration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MaskError::UnknownStrategy("rot13".to_string());
        assert_eq!(err.to_string(), "unknown masking strategy 'rot13'");

        let err = MaskError::RecursionLimitExceeded {
            type_name: "Node".to_string(),
            limit: 32,
        };
        assert_eq!(
            err.to_string(),
            "recursion limit of 32 exceeded while masking type 'Node'"
        );
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = MaskError::UnknownType("User".to_string());
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_error_is_cloneable() {
        let err = MaskError::InvalidDescriptor {
            context: "User.email".to_string(),
            reason: "empty path segment".to_string(),
        };
        assert_eq!(err.clone(), err);
    }
}
