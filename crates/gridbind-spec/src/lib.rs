//! Override documents for the gridbind mapping engine.
//!
//! An [`OverrideDocument`] replaces the mapping directives compiled into a
//! class at runtime: entries are keyed by fully-qualified class name, then by
//! member name, and each entry is an attribute bag tagged with a
//! [`DirectiveKind`]. This crate owns the serde model, structural validation
//! and the JSON schema; turning entries into concrete directives is the
//! engine's job.

mod document;
mod validation;

pub use document::{
    CURRENT_SPEC_VERSION, ClassOverride, DirectiveEntry, DirectiveKind, DocumentMeta,
    OverrideDocument, SPEC_IDENT, SpecVersion,
};
pub use validation::{OverrideIssue, ValidationError};

/// JSON schema of [`OverrideDocument`] as a `serde_json::Value`.
pub fn generate_schema_value() -> serde_json::Value {
    let schema = schemars::schema_for!(OverrideDocument);
    serde_json::to_value(&schema).unwrap_or(serde_json::Value::Null)
}

/// Pretty-printed JSON schema of [`OverrideDocument`].
pub fn generate_schema_json_pretty() -> String {
    serde_json::to_string_pretty(&generate_schema_value()).unwrap_or_default()
}
