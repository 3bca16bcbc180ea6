//! Call-scoped masking context

use std::collections::HashMap;

/// Caller-supplied, call-scoped data consulted by conditional masking.
///
/// A context carries boolean flags (e.g. `"isAdminView"`) and free-form
/// string attributes. It is owned by the caller and passed by reference into
/// [`MaskEngine::mask`](crate::MaskEngine::mask) for the duration of one
/// masking operation.
///
/// # Examples
///
/// ```
/// use shroud::MaskingContext;
///
/// let ctx = MaskingContext::new()
///     .with_flag("isAdminView", true)
///     .with_attribute("tenant", "acme");
///
/// assert!(ctx.flag("isAdminView"));
/// assert!(!ctx.flag("unknown"));
/// assert_eq!(ctx.attribute("tenant"), Some("acme"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskingContext {
    flags: HashMap<String, bool>,
    attributes: HashMap<String, String>,
}

impl MaskingContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag, consuming and returning the context
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    /// Set an attribute, consuming and returning the context
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a flag in place
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    /// Look up a flag; unset flags read as `false`
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Look up an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
