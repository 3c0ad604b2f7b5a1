use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::errors::Result;
use crate::model::SchemaDefinition;

/// Emit the JSON Schema for definition files.
pub fn definition_json_schema() -> RootSchema {
    schema_for!(SchemaDefinition)
}

/// JSON Schema for definition files as a JSON value, ready for validation.
pub fn definition_json_schema_value() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(definition_json_schema())?)
}
