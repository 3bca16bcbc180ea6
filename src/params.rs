//! Strategy parameters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters passed to a masking strategy.
///
/// All fields have defaults, so a declaration only needs to spell out what it
/// changes. Unknown keys are collected into `extra` for custom strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Characters left visible at the start of the value (`fixed`)
    #[serde(default)]
    pub visible_prefix: usize,

    /// Characters left visible at the end of the value (`fixed`)
    #[serde(default)]
    pub visible_suffix: usize,

    /// Replacement character for masked positions
    #[serde(default = "default_mask_char")]
    pub mask_char: char,

    /// Bucket width for the `numeric_range` strategy
    #[serde(default = "default_bucket_width")]
    pub bucket_width: u64,

    /// Capture-group pattern for the `regex` strategy
    #[serde(default)]
    pub pattern: Option<String>,

    /// Optional replacement template for the `regex` strategy (`${1}` refs)
    #[serde(default)]
    pub replacement: Option<String>,

    /// Mask map keys as well as values (explicit opt-in)
    #[serde(default)]
    pub mask_keys: bool,

    /// Free-form parameters for custom strategies
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_mask_char() -> char {
    '*'
}

fn default_bucket_width() -> u64 {
    10
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            visible_prefix: 0,
            visible_suffix: 0,
            mask_char: default_mask_char(),
            bucket_width: default_bucket_width(),
            pattern: None,
            replacement: None,
            mask_keys: false,
            extra: BTreeMap::new(),
        }
    }
}

impl StrategyParams {
    /// Set the visible prefix/suffix window
    pub fn with_visible(mut self, prefix: usize, suffix: usize) -> Self {
        self.visible_prefix = prefix;
        self.visible_suffix = suffix;
        self
    }

    /// Set the mask character
    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    /// Set the bucket width for `numeric_range`
    pub fn with_bucket_width(mut self, width: u64) -> Self {
        self.bucket_width = width;
        self
    }

    /// Set the pattern for the `regex` strategy
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the replacement template for the `regex` strategy
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    /// Mask map keys as well as values
    pub fn with_mask_keys(mut self, mask_keys: bool) -> Self {
        self.mask_keys = mask_keys;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = StrategyParams::default();
        assert_eq!(params.visible_prefix, 0);
        assert_eq!(params.visible_suffix, 0);
        assert_eq!(params.mask_char, '*');
        assert_eq!(params.bucket_width, 10);
        assert!(params.pattern.is_none());
        assert!(!params.mask_keys);
    }

    #[test]
    fn test_deserialize_partial() {
        let params: StrategyParams =
            serde_json::from_str(r##"{"visible_prefix": 4, "mask_char": "#"}"##).unwrap();
        assert_eq!(params.visible_prefix, 4);
        assert_eq!(params.mask_char, '#');
        assert_eq!(params.bucket_width, 10);
    }

    #[test]
    fn test_extra_params_collected() {
        let params: StrategyParams =
            serde_json::from_str(r#"{"salt": "abc", "rounds": 3}"#).unwrap();
        assert_eq!(params.extra.len(), 2);
        assert_eq!(params.extra["salt"], serde_json::json!("abc"));
        assert_eq!(params.extra["rounds"], serde_json::json!(3));
    }

    #[test]
    fn test_builder() {
        let params = StrategyParams::default()
            .with_visible(1, 1)
            .with_mask_char('x')
            .with_bucket_width(5);
        assert_eq!(params.visible_prefix, 1);
        assert_eq!(params.visible_suffix, 1);
        assert_eq!(params.mask_char, 'x');
        assert_eq!(params.bucket_width, 5);
    }
}
