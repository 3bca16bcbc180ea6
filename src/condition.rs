//! Conditional masking
//!
//! Conditions decide per field, per call, whether the declared strategy is
//! applied. They are compiled once at descriptor-resolution time; evaluation
//! never fails.

use crate::context::MaskingContext;
use crate::error::MaskError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared activation condition for a field.
///
/// When a declaration carries no condition, the field is always masked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionSpec {
    /// Mask unconditionally
    Always,

    /// Mask depending on a context flag.
    ///
    /// The field is masked when the flag's state equals `mask_when_set`.
    /// With `mask_when_set = false` (e.g. `"isAdminView"`), the field stays
    /// readable for callers that set the flag and is masked for everyone
    /// else.
    ContextFlag {
        flag: String,
        #[serde(default = "default_mask_when_set")]
        mask_when_set: bool,
    },

    /// Mask only when the field's current value matches a pattern
    ValueMatches { pattern: String },

    /// Mask only non-empty values
    NonEmpty,
}

fn default_mask_when_set() -> bool {
    true
}

/// Compiled condition, ready for evaluation on the dispatch path.
#[derive(Debug, Clone)]
pub(crate) enum Condition {
    Always,
    ContextFlag { flag: String, mask_when_set: bool },
    ValueMatches { regex: Regex },
    NonEmpty,
}

impl Condition {
    /// Compile a declared condition. Pattern errors surface here, at
    /// resolution time, never during evaluation.
    pub(crate) fn compile(spec: &ConditionSpec, field: &str) -> Result<Self, MaskError> {
        match spec {
            ConditionSpec::Always => Ok(Self::Always),
            ConditionSpec::ContextFlag {
                flag,
                mask_when_set,
            } => Ok(Self::ContextFlag {
                flag: flag.clone(),
                mask_when_set: *mask_when_set,
            }),
            ConditionSpec::ValueMatches { pattern } => {
                let regex = Regex::new(pattern).map_err(|e| MaskError::InvalidCondition {
                    field: field.to_string(),
                    reason: format!("invalid pattern '{pattern}': {e}"),
                })?;
                Ok(Self::ValueMatches { regex })
            }
            ConditionSpec::NonEmpty => Ok(Self::NonEmpty),
        }
    }

    /// Evaluate against the field's current value and the call context.
    pub(crate) fn is_active(&self, value: &Value, ctx: &MaskingContext) -> bool {
        match self {
            Self::Always => true,
            Self::ContextFlag {
                flag,
                mask_when_set,
            } => ctx.flag(flag) == *mask_when_set,
            Self::ValueMatches { regex } => match value {
                Value::String(s) => regex.is_match(s),
                Value::Number(n) => regex.is_match(&n.to_string()),
                Value::Bool(b) => regex.is_match(if *b { "true" } else { "false" }),
                _ => false,
            },
            Self::NonEmpty => match value {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
                _ => true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_always_active() {
        let cond = Condition::compile(&ConditionSpec::Always, "f").unwrap();
        assert!(cond.is_active(&json!("x"), &MaskingContext::new()));
        assert!(cond.is_active(&json!(null), &MaskingContext::new()));
    }

    #[test]
    fn test_context_flag_default_masks_when_set() {
        let spec = ConditionSpec::ContextFlag {
            flag: "redactAll".to_string(),
            mask_when_set: true,
        };
        let cond = Condition::compile(&spec, "f").unwrap();

        let ctx = MaskingContext::new().with_flag("redactAll", true);
        assert!(cond.is_active(&json!("x"), &ctx));
        assert!(!cond.is_active(&json!("x"), &MaskingContext::new()));
    }

    #[test]
    fn test_context_flag_inverted_for_privileged_views() {
        let spec = ConditionSpec::ContextFlag {
            flag: "isAdminView".to_string(),
            mask_when_set: false,
        };
        let cond = Condition::compile(&spec, "f").unwrap();

        let admin = MaskingContext::new().with_flag("isAdminView", true);
        assert!(!cond.is_active(&json!("x"), &admin));
        assert!(cond.is_active(&json!("x"), &MaskingContext::new()));
    }

    #[test]
    fn test_value_matches() {
        let spec = ConditionSpec::ValueMatches {
            pattern: r"^\d+$".to_string(),
        };
        let cond = Condition::compile(&spec, "f").unwrap();

        let ctx = MaskingContext::new();
        assert!(cond.is_active(&json!("12345"), &ctx));
        assert!(cond.is_active(&json!(42), &ctx));
        assert!(!cond.is_active(&json!("abc"), &ctx));
        assert!(!cond.is_active(&json!(null), &ctx));
    }

    #[test]
    fn test_invalid_pattern_fails_at_compile() {
        let spec = ConditionSpec::ValueMatches {
            pattern: "(".to_string(),
        };
        let err = Condition::compile(&spec, "User.email").unwrap_err();
        assert!(matches!(err, MaskError::InvalidCondition { ref field, .. } if field == "User.email"));
    }

    #[test]
    fn test_non_empty() {
        let cond = Condition::compile(&ConditionSpec::NonEmpty, "f").unwrap();
        let ctx = MaskingContext::new();
        assert!(cond.is_active(&json!("x"), &ctx));
        assert!(!cond.is_active(&json!(""), &ctx));
        assert!(!cond.is_active(&json!(null), &ctx));
        assert!(cond.is_active(&json!(0), &ctx));
    }

    #[test]
    fn test_spec_deserialization() {
        let spec: ConditionSpec =
            serde_json::from_str(r#"{"kind": "context_flag", "flag": "isAdminView", "mask_when_set": false}"#)
                .unwrap();
        assert_eq!(
            spec,
            ConditionSpec::ContextFlag {
                flag: "isAdminView".to_string(),
                mask_when_set: false,
            }
        );

        let unknown = serde_json::from_str::<ConditionSpec>(r#"{"kind": "geo_fence"}"#);
        assert!(unknown.is_err());
    }
}
