//! Masking declarations
//!
//! A declaration table maps a type name to the ordered list of fields that
//! should be masked, reflection-free. Tables are built in code or loaded from
//! a TOML document:
//!
//! ```toml
//! [types.User]
//! fields = [
//!     { path = "email", strategy = "email" },
//!     { path = "card", strategy = "card", params = { mask_char = "#" } },
//!     { path = "profile", nested = "Profile" },
//! ]
//! ```

use crate::condition::ConditionSpec;
use crate::error::MaskError;
use crate::params::StrategyParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// How a null field value is treated when its descriptor is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// Null passes through unchanged
    #[default]
    PassThrough,
    /// Null is replaced with an empty string
    MaskAsEmpty,
}

/// Declared masking metadata for one field of a type.
///
/// Exactly one of `strategy` and `nested` must be set: a field either holds
/// a leaf value masked by a strategy, or a nested object masked against
/// another declared type. Violations surface as
/// [`MaskError::InvalidDescriptor`] when the type is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Dotted accessor path from the type's root, e.g. `"user.email"`
    pub path: String,

    /// Strategy id for leaf fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Strategy parameters
    #[serde(default)]
    pub params: StrategyParams,

    /// Activation condition; absent means always mask
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionSpec>,

    /// Null handling
    #[serde(default)]
    pub null_policy: NullPolicy,

    /// Declared type name for nested object/collection fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<String>,
}

impl FieldDeclaration {
    /// Declare a leaf field masked by a strategy
    pub fn masked(path: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            strategy: Some(strategy.into()),
            params: StrategyParams::default(),
            condition: None,
            null_policy: NullPolicy::default(),
            nested: None,
        }
    }

    /// Declare a nested field masked against another declared type
    pub fn nested(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            strategy: None,
            params: StrategyParams::default(),
            condition: None,
            null_policy: NullPolicy::default(),
            nested: Some(type_name.into()),
        }
    }

    /// Set strategy parameters
    pub fn with_params(mut self, params: StrategyParams) -> Self {
        self.params = params;
        self
    }

    /// Set the activation condition
    pub fn with_condition(mut self, condition: ConditionSpec) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Set the null policy
    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }
}

/// Ordered field declarations for one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Type name, the key callers pass to `mask()`
    pub name: String,
    /// Field declarations in declaration order
    pub fields: Vec<FieldDeclaration>,
}

impl TypeDeclaration {
    /// Create a type declaration
    pub fn new(name: impl Into<String>, fields: Vec<FieldDeclaration>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Type name -> field declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    types: HashMap<String, TypeDeclaration>,
}

impl DeclarationTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a type declaration
    pub fn declare(&mut self, declaration: TypeDeclaration) -> &mut Self {
        if self.types.contains_key(&declaration.name) {
            tracing::debug!(type_name = %declaration.name, "replacing masking declaration");
        }
        self.types.insert(declaration.name.clone(), declaration);
        self
    }

    /// Look up a type declaration
    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.get(name)
    }

    /// Check whether a type is declared
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of declared types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table has no declarations
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Parse a declaration table from a TOML document
    pub fn from_toml(content: &str) -> Result<Self, MaskError> {
        let file: DeclarationFile = toml::from_str(content).map_err(|e| {
            MaskError::Declaration(format!("failed to parse declaration table: {e}"))
        })?;

        let mut table = Self::new();
        for (name, entry) in file.types {
            table.declare(TypeDeclaration::new(name, entry.fields));
        }
        Ok(table)
    }

    /// Load a declaration table from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MaskError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            MaskError::Declaration(format!(
                "failed to read declaration table {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }
}

/// TOML document shape
#[derive(Debug, Deserialize)]
struct DeclarationFile {
    #[serde(default)]
    types: HashMap<String, TypeEntry>,
}

#[derive(Debug, Deserialize)]
struct TypeEntry {
    #[serde(default)]
    fields: Vec<FieldDeclaration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let decl = FieldDeclaration::masked("email", "email")
            .with_null_policy(NullPolicy::MaskAsEmpty)
            .with_condition(ConditionSpec::NonEmpty);
        assert_eq!(decl.path, "email");
        assert_eq!(decl.strategy.as_deref(), Some("email"));
        assert_eq!(decl.null_policy, NullPolicy::MaskAsEmpty);
        assert!(decl.nested.is_none());

        let nested = FieldDeclaration::nested("profile", "Profile");
        assert!(nested.strategy.is_none());
        assert_eq!(nested.nested.as_deref(), Some("Profile"));
    }

    #[test]
    fn test_from_toml() {
        let table = DeclarationTable::from_toml(
            r##"
            [types.User]
            fields = [
                { path = "email", strategy = "email" },
                { path = "card", strategy = "card", params = { mask_char = "#" } },
                { path = "profile", nested = "Profile" },
            ]

            [types.Profile]
            fields = [
                { path = "phone", strategy = "phone" },
            ]
            "##,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let user = table.get("User").unwrap();
        assert_eq!(user.fields.len(), 3);
        assert_eq!(user.fields[0].path, "email");
        assert_eq!(user.fields[1].params.mask_char, '#');
        assert_eq!(user.fields[2].nested.as_deref(), Some("Profile"));
    }

    #[test]
    fn test_from_toml_with_condition() {
        let table = DeclarationTable::from_toml(
            r#"
            [types.Account]
            fields = [
                { path = "balance", strategy = "numeric_range", condition = { kind = "context_flag", flag = "isAdminView", mask_when_set = false } },
            ]
            "#,
        )
        .unwrap();

        let account = table.get("Account").unwrap();
        assert_eq!(
            account.fields[0].condition,
            Some(ConditionSpec::ContextFlag {
                flag: "isAdminView".to_string(),
                mask_when_set: false,
            })
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = DeclarationTable::from_toml("types = 3").unwrap_err();
        assert!(matches!(err, MaskError::Declaration(_)));

        let unknown_condition = DeclarationTable::from_toml(
            r#"
            [types.User]
            fields = [
                { path = "email", strategy = "email", condition = { kind = "geo_fence" } },
            ]
            "#,
        );
        assert!(matches!(
            unknown_condition.unwrap_err(),
            MaskError::Declaration(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = DeclarationTable::from_file("/nonexistent/masking.toml").unwrap_err();
        assert!(matches!(err, MaskError::Declaration(_)));
    }
}
