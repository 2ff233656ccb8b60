//! JSON Schema for the configuration document.

use crate::config::ConfigDocument;

/// Schema identifier embedded in generated schemas.
pub const SCHEMA_ID: &str =
    "https://raw.githubusercontent.com/tagtile/tagtile/main/tagtile.schema.json";

/// Generates a JSON Schema for the configuration document.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(ConfigDocument);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!(SCHEMA_ID));
    }

    schema
}

/// Generates a pretty-printed JSON Schema string.
#[must_use]
pub fn print_schema() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
