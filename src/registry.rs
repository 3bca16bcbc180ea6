//! Strategy registry
//!
//! Read-mostly shared state: registration happens at process start (or lazily
//! before the first mask touching the id), resolution happens on every
//! descriptor compilation. Locks are held only long enough to clone the
//! `Arc`'d definition out.

use crate::error::MaskError;
use crate::params::StrategyParams;
use crate::strategy::{builtin, StrategyDefinition};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry mapping strategy ids to their definitions.
///
/// # Examples
///
/// ```
/// use shroud::{StrategyDefinition, StrategyRegistry};
///
/// let registry = StrategyRegistry::with_builtins();
/// registry.register(StrategyDefinition::new("hidden", |_, _| "<hidden>".to_string()));
///
/// assert!(registry.resolve("email").is_ok());
/// assert!(registry.resolve("hidden").is_ok());
/// assert!(registry.resolve("rot13").is_err());
/// ```
#[derive(Debug)]
pub struct StrategyRegistry {
    inner: RwLock<HashMap<String, StrategyDefinition>>,
}

impl StrategyRegistry {
    /// Create a registry pre-populated with the built-in strategies
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        {
            let mut guard = registry.write();
            for def in builtin::all() {
                guard.insert(def.id().to_string(), def);
            }
        }
        registry
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Register a strategy, replacing any existing definition with the same
    /// id. Replacement is atomic with respect to concurrent resolves and is
    /// reported as a conflict warning, never silently.
    pub fn register(&self, definition: StrategyDefinition) {
        let id = definition.id().to_string();
        let replaced = self.write().insert(id.clone(), definition).is_some();
        if replaced {
            tracing::warn!(strategy = %id, "re-registering masking strategy, replacing existing definition");
        }
    }

    /// Resolve a strategy id to its definition
    pub fn resolve(&self, id: &str) -> Result<StrategyDefinition, MaskError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| MaskError::UnknownStrategy(id.to_string()))
    }

    /// Check whether an id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Validate parameters against a strategy's validator.
    ///
    /// Intended for descriptor-resolution time, so misconfiguration surfaces
    /// once and early rather than at every call.
    pub fn validate_params(&self, id: &str, params: &StrategyParams) -> Result<(), MaskError> {
        let definition = self.resolve(id)?;
        definition
            .validate_params(params)
            .map_err(|reason| MaskError::InvalidDescriptor {
                context: format!("strategy '{id}'"),
                reason,
            })
    }

    /// Restore the built-in-only state, dropping custom registrations.
    ///
    /// Test teardown contract: lets test cases share the process-wide
    /// registry without leaking strategies into each other.
    pub fn reset(&self) {
        let mut guard = self.write();
        guard.clear();
        for def in builtin::all() {
            guard.insert(def.id().to_string(), def);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StrategyDefinition>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StrategyDefinition>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// The process-wide registry, initialized with the built-ins on first use.
///
/// Engines constructed with
/// [`MaskEngine::with_registry`](crate::MaskEngine::with_registry) can share
/// it; [`reset`](StrategyRegistry::reset) restores its built-in-only state
/// between test cases.
pub fn global() -> Arc<StrategyRegistry> {
    static GLOBAL: OnceLock<Arc<StrategyRegistry>> = OnceLock::new();
    GLOBAL
        .get_or_init(|| Arc::new(StrategyRegistry::with_builtins()))
        .clone()
}

/// Register a strategy with the process-wide registry.
///
/// Must be called before the first `mask()` affecting the id; engines bind
/// strategies when a type's descriptors are first resolved.
pub fn register_strategy(definition: StrategyDefinition) {
    global().register(definition);
}
