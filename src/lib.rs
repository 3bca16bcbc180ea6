// Shroud - Declarative field-level data masking
// Copyright (c) 2026 Shroud Contributors
// Licensed under the MIT License

//! # Shroud - Declarative field-level data masking
//!
//! Shroud rewrites the values of explicitly declared sensitive fields —
//! emails, phone numbers, card numbers, free-text secrets — in a
//! [`serde_json::Value`] bound for serialization, logging, or an API
//! response, without mutating the original value.
//!
//! Sensitivity is never inferred: every masked field is declared per type in
//! a [`DeclarationTable`]. Masking is lossy and one-directional; there is no
//! encryption or reversible tokenization here.
//!
//! ## Architecture
//!
//! - [`registry`] - strategy id -> definition, built-ins plus custom
//! - [`strategy`] - pure `(value, params) -> String` masking transforms
//! - [`declaration`] - per-type field metadata, in code or from TOML
//! - [`engine`] - the dispatcher: resolves descriptors (cached per type),
//!   evaluates conditions, applies strategies, assembles the masked copy
//! - [`condition`] - per-field activation conditions
//!
//! ## Quick start
//!
//! ```
//! use shroud::{DeclarationTable, FieldDeclaration, MaskEngine, MaskingContext, TypeDeclaration};
//! use serde_json::json;
//!
//! let mut table = DeclarationTable::new();
//! table.declare(TypeDeclaration::new(
//!     "User",
//!     vec![FieldDeclaration::masked("email", "email")],
//! ));
//!
//! let engine = MaskEngine::new(table);
//! let masked = engine.mask(
//!     "User",
//!     &json!({"email": "john.doe@example.com", "id": 7}),
//!     &MaskingContext::new(),
//! )?;
//!
//! assert_eq!(masked["email"], "j*******@example.com");
//! assert_eq!(masked["id"], 7);
//! # Ok::<(), shroud::MaskError>(())
//! ```
//!
//! ## Custom strategies
//!
//! ```
//! use shroud::{
//!     DeclarationTable, FieldDeclaration, MaskEngine, MaskingContext, StrategyDefinition,
//!     TypeDeclaration,
//! };
//! use serde_json::json;
//!
//! let mut table = DeclarationTable::new();
//! table.declare(TypeDeclaration::new(
//!     "Session",
//!     vec![FieldDeclaration::masked("token", "hidden")],
//! ));
//!
//! let engine = MaskEngine::new(table);
//! engine
//!     .registry()
//!     .register(StrategyDefinition::new("hidden", |_, _| "<hidden>".to_string()));
//!
//! let masked = engine.mask("Session", &json!({"token": "tok_123"}), &MaskingContext::new())?;
//! assert_eq!(masked["token"], "<hidden>");
//! # Ok::<(), shroud::MaskError>(())
//! ```
//!
//! ## Error handling
//!
//! Misconfiguration (unknown strategy ids, malformed paths, bad patterns)
//! fails when a type's descriptors are first resolved, as a [`MaskError`];
//! the failure is cached and replayed, never silently skipped. Strategy
//! application itself never fails: malformed values degrade to a full mask.
//!
//! Shroud never logs on the caller's behalf. The only `tracing` emissions
//! are a warning on strategy re-registration and debug-level diagnostics.

pub mod condition;
pub mod context;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod params;
pub mod registry;
mod resolver;
pub mod strategy;

pub use condition::ConditionSpec;
pub use context::MaskingContext;
pub use declaration::{DeclarationTable, FieldDeclaration, NullPolicy, TypeDeclaration};
pub use engine::MaskEngine;
pub use error::MaskError;
pub use params::StrategyParams;
pub use registry::{global, register_strategy, StrategyRegistry};
pub use strategy::StrategyDefinition;
