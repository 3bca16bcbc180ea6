//! Masking dispatcher
//!
//! [`MaskEngine`] is the orchestration core: it resolves a type's field
//! descriptors (cached per type name, failures included), gates each field on
//! its condition, invokes the bound strategy, and assembles a masked copy of
//! the input. The input value is never mutated.
//!
//! The engine is a synchronous, in-memory transform intended to sit inline on
//! serialization paths. It is `Send + Sync`; share it across threads behind
//! an `Arc`. The descriptor cache and strategy registry are the only shared
//! mutable state, both read-mostly and `RwLock`-guarded.

use crate::context::MaskingContext;
use crate::declaration::{DeclarationTable, NullPolicy};
use crate::error::MaskError;
use crate::params::StrategyParams;
use crate::registry::StrategyRegistry;
use crate::resolver::{self, FieldAction, FieldDescriptor};
use crate::strategy::StrategyDefinition;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Default recursion depth guard.
pub const DEFAULT_MAX_DEPTH: usize = 32;

type Resolution = Result<Arc<[FieldDescriptor]>, MaskError>;

/// Field-level masking engine.
///
/// # Examples
///
/// ```
/// use shroud::{DeclarationTable, FieldDeclaration, MaskEngine, MaskingContext, TypeDeclaration};
/// use serde_json::json;
///
/// let mut table = DeclarationTable::new();
/// table.declare(TypeDeclaration::new(
///     "User",
///     vec![
///         FieldDeclaration::masked("email", "email"),
///         FieldDeclaration::masked("phone", "phone"),
///     ],
/// ));
///
/// let engine = MaskEngine::new(table);
/// let user = json!({"email": "john.doe@example.com", "phone": "010-1234-5678", "id": 7});
///
/// let masked = engine.mask("User", &user, &MaskingContext::new())?;
/// assert_eq!(masked["email"], "j*******@example.com");
/// assert_eq!(masked["phone"], "***-****-5678");
/// assert_eq!(masked["id"], 7); // undeclared fields pass through
/// # Ok::<(), shroud::MaskError>(())
/// ```
pub struct MaskEngine {
    registry: Arc<StrategyRegistry>,
    declarations: DeclarationTable,
    cache: RwLock<HashMap<String, Resolution>>,
    max_depth: usize,
}

impl MaskEngine {
    /// Create an engine with its own built-in strategy registry
    pub fn new(declarations: DeclarationTable) -> Self {
        Self::with_registry(declarations, Arc::new(StrategyRegistry::with_builtins()))
    }

    /// Create an engine over a shared strategy registry
    pub fn with_registry(declarations: DeclarationTable, registry: Arc<StrategyRegistry>) -> Self {
        Self {
            registry,
            declarations,
            cache: RwLock::new(HashMap::new()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the recursion depth guard
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The engine's strategy registry
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Mask an instance of a declared type.
    ///
    /// Returns a new value; `instance` is never mutated. A top-level array is
    /// masked element-wise against the same type. For identical inputs the
    /// output is identical (masking is deterministic), though not idempotent:
    /// masking an already-masked value may mask it further.
    ///
    /// # Errors
    ///
    /// Resolution errors ([`MaskError::UnknownStrategy`],
    /// [`MaskError::InvalidDescriptor`], [`MaskError::InvalidCondition`],
    /// [`MaskError::UnknownType`]) are cached per type and replayed on every
    /// subsequent call for that type.
    /// [`MaskError::RecursionLimitExceeded`] aborts only the offending call.
    pub fn mask(
        &self,
        type_name: &str,
        instance: &Value,
        ctx: &MaskingContext,
    ) -> Result<Value, MaskError> {
        self.mask_at_depth(type_name, instance, ctx, 0)
    }

    fn mask_at_depth(
        &self,
        type_name: &str,
        instance: &Value,
        ctx: &MaskingContext,
        depth: usize,
    ) -> Result<Value, MaskError> {
        self.check_depth(type_name, depth)?;
        let descriptors = self.descriptors_for(type_name)?;

        match instance {
            Value::Array(items) => items
                .iter()
                .map(|item| self.mask_at_depth(type_name, item, ctx, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(_) => {
                let mut masked = instance.clone();
                for descriptor in descriptors.iter() {
                    self.apply_descriptor(type_name, descriptor, instance, &mut masked, ctx, depth)?;
                }
                Ok(masked)
            }
            other => Ok(other.clone()),
        }
    }

    fn apply_descriptor(
        &self,
        type_name: &str,
        descriptor: &FieldDescriptor,
        instance: &Value,
        masked: &mut Value,
        ctx: &MaskingContext,
        depth: usize,
    ) -> Result<(), MaskError> {
        let segments = descriptor.path.segments();
        let Some(current) = value_at_path(instance, segments) else {
            // Declared field absent from this instance; nothing to mask.
            return Ok(());
        };

        if !descriptor.condition.is_active(current, ctx) {
            return Ok(());
        }

        if current.is_null() {
            if descriptor.null_policy == NullPolicy::MaskAsEmpty {
                replace_at_path(masked, segments, Value::String(String::new()));
            }
            return Ok(());
        }

        let replacement = match &descriptor.action {
            FieldAction::Recurse { type_name: nested } => {
                self.mask_at_depth(nested, current, ctx, depth + 1)?
            }
            FieldAction::Apply { strategy, params } => {
                self.apply_leafwise(type_name, strategy, params, current, depth)?
            }
        };
        replace_at_path(masked, segments, replacement);
        Ok(())
    }

    /// Apply a strategy to a leaf value, or element-wise to a collection.
    /// Map keys are masked only when `mask_keys` is set.
    fn apply_leafwise(
        &self,
        type_name: &str,
        strategy: &StrategyDefinition,
        params: &StrategyParams,
        value: &Value,
        depth: usize,
    ) -> Result<Value, MaskError> {
        match value {
            Value::String(s) => Ok(Value::String(strategy.apply(s, params))),
            Value::Number(n) => Ok(Value::String(strategy.apply(&n.to_string(), params))),
            Value::Bool(b) => Ok(Value::String(
                strategy.apply(if *b { "true" } else { "false" }, params),
            )),
            Value::Null => Ok(Value::Null),
            Value::Array(items) => {
                self.check_depth(type_name, depth + 1)?;
                let masked = items
                    .iter()
                    .map(|item| self.apply_leafwise(type_name, strategy, params, item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(masked))
            }
            Value::Object(map) => {
                self.check_depth(type_name, depth + 1)?;
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map {
                    let key = if params.mask_keys {
                        strategy.apply(key, params)
                    } else {
                        key.clone()
                    };
                    let item = self.apply_leafwise(type_name, strategy, params, item, depth + 1)?;
                    out.insert(key, item);
                }
                Ok(Value::Object(out))
            }
        }
    }

    fn check_depth(&self, type_name: &str, depth: usize) -> Result<(), MaskError> {
        if depth >= self.max_depth {
            return Err(MaskError::RecursionLimitExceeded {
                type_name: type_name.to_string(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    /// Resolve and cache a type's descriptors. Failures are cached alongside
    /// successes so misconfiguration is reported once and replayed cheaply.
    fn descriptors_for(&self, type_name: &str) -> Resolution {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(resolution) = cache.get(type_name) {
                return resolution.clone();
            }
        }

        tracing::debug!(type_name, "resolving masking descriptors");
        let resolution = match self.declarations.get(type_name) {
            Some(declaration) => resolver::resolve_type(declaration, &self.registry),
            None => Err(MaskError::UnknownType(type_name.to_string())),
        };

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(type_name.to_string())
            .or_insert(resolution)
            .clone()
    }
}

/// Navigate a dotted path through nested objects.
fn value_at_path<'a>(value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Replace the value at a dotted path, if the path exists.
fn replace_at_path(value: &mut Value, segments: &[String], replacement: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    let Value::Object(map) = value else {
        return;
    };

    if rest.is_empty() {
        if map.contains_key(first) {
            map.insert(first.clone(), replacement);
        }
        return;
    }

    if let Some(next) = map.get_mut(first) {
        replace_at_path(next, rest, replacement);
    }
}
