//! Field descriptor resolution
//!
//! Compiles a type's declarations into immutable field descriptors: parsed
//! paths, strategies bound with validated parameters, compiled conditions.
//! Everything that can be misconfigured fails here, once, never on the
//! dispatch path.

use crate::condition::Condition;
use crate::declaration::{NullPolicy, TypeDeclaration};
use crate::error::MaskError;
use crate::params::StrategyParams;
use crate::registry::StrategyRegistry;
use crate::strategy::StrategyDefinition;
use std::fmt;
use std::sync::Arc;

/// Parsed dotted field path.
///
/// Segments name object keys from the type's root; paths never traverse
/// through arrays (collections are masked element-wise via their declared
/// strategy or nested type instead).
#[derive(Debug, Clone)]
pub(crate) struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Err("field path is empty".to_string());
        }
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(format!("field path '{raw}' has an empty segment"));
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub(crate) fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What an active descriptor does to its field.
#[derive(Debug, Clone)]
pub(crate) enum FieldAction {
    /// Apply a bound strategy to a leaf value (element-wise for collections)
    Apply {
        strategy: StrategyDefinition,
        params: StrategyParams,
    },
    /// Recursively mask against another declared type, resolved lazily at
    /// dispatch time so cyclic type graphs stay resolvable
    Recurse { type_name: String },
}

/// Compiled, immutable masking metadata for one field.
#[derive(Debug, Clone)]
pub(crate) struct FieldDescriptor {
    pub(crate) path: FieldPath,
    pub(crate) action: FieldAction,
    pub(crate) condition: Condition,
    pub(crate) null_policy: NullPolicy,
}

/// Resolve a type's declarations into descriptors, in declaration order.
pub(crate) fn resolve_type(
    declaration: &TypeDeclaration,
    registry: &StrategyRegistry,
) -> Result<Arc<[FieldDescriptor]>, MaskError> {
    let mut descriptors = Vec::with_capacity(declaration.fields.len());

    for field in &declaration.fields {
        let context = format!("{}.{}", declaration.name, field.path);

        let path = FieldPath::parse(&field.path).map_err(|reason| {
            MaskError::InvalidDescriptor {
                context: context.clone(),
                reason,
            }
        })?;

        let action = match (&field.strategy, &field.nested) {
            (Some(_), Some(_)) => {
                return Err(MaskError::InvalidDescriptor {
                    context,
                    reason: "field declares both a strategy and a nested type".to_string(),
                })
            }
            (None, None) => {
                return Err(MaskError::InvalidDescriptor {
                    context,
                    reason: "field declares neither a strategy nor a nested type".to_string(),
                })
            }
            (Some(id), None) => {
                let strategy = registry.resolve(id)?;
                strategy.validate_params(&field.params).map_err(|reason| {
                    MaskError::InvalidDescriptor {
                        context: context.clone(),
                        reason,
                    }
                })?;
                FieldAction::Apply {
                    strategy,
                    params: field.params.clone(),
                }
            }
            (None, Some(type_name)) => {
                if type_name.trim().is_empty() {
                    return Err(MaskError::InvalidDescriptor {
                        context,
                        reason: "nested type name is empty".to_string(),
                    });
                }
                FieldAction::Recurse {
                    type_name: type_name.clone(),
                }
            }
        };

        let condition = match &field.condition {
            Some(spec) => Condition::compile(spec, &context)?,
            None => Condition::Always,
        };

        descriptors.push(FieldDescriptor {
            path,
            action,
            condition,
            null_policy: field.null_policy,
        });
    }

    Ok(descriptors.into())
}
