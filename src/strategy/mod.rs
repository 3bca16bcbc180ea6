//! Masking strategies
//!
//! A strategy is a pure `(raw value, parameters) -> String` transform.
//! Built-in strategies live in [`builtin`]; custom ones are registered with
//! the [`StrategyRegistry`](crate::StrategyRegistry) as a
//! [`StrategyDefinition`] wrapping a caller-supplied closure.

pub mod builtin;

use crate::params::StrategyParams;
use std::fmt;
use std::sync::Arc;

/// Masking function: raw value + parameters in, masked string out.
pub type ApplyFn = dyn Fn(&str, &StrategyParams) -> String + Send + Sync;

/// Parameter validator, invoked at registration/resolution time.
pub type ValidateFn = dyn Fn(&StrategyParams) -> Result<(), String> + Send + Sync;

/// A registered masking strategy.
///
/// Cheap to clone; the apply function is shared behind an `Arc` so resolved
/// field descriptors can hold their strategy without a registry round-trip at
/// dispatch time.
#[derive(Clone)]
pub struct StrategyDefinition {
    id: String,
    apply: Arc<ApplyFn>,
    validate: Option<Arc<ValidateFn>>,
}

impl StrategyDefinition {
    /// Create a strategy definition from a masking function
    pub fn new(
        id: impl Into<String>,
        apply: impl Fn(&str, &StrategyParams) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            apply: Arc::new(apply),
            validate: None,
        }
    }

    /// Attach a parameter validator
    pub fn with_validator(
        mut self,
        validate: impl Fn(&StrategyParams) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// The strategy id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Apply the strategy to a raw value.
    ///
    /// Empty input is returned unchanged; this holds for every strategy,
    /// including custom ones.
    pub fn apply(&self, raw: &str, params: &StrategyParams) -> String {
        if raw.is_empty() {
            return String::new();
        }
        (self.apply)(raw, params)
    }

    /// Validate parameters against this strategy's validator, if any
    pub fn validate_params(&self, params: &StrategyParams) -> Result<(), String> {
        match &self.validate {
            Some(validate) => validate(params),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for StrategyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyDefinition")
            .field("id", &self.id)
            .field("has_validator", &self.validate.is_some())
            .finish()
    }
}
