use bulkparse_core::FieldType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Contract version for definition files.
pub const DEFINITION_VERSION: &str = "0.1";

/// Declarative import schema, the file form of a core `Schema`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    /// Contract version for the definition format.
    pub definition_version: String,
    /// Human-readable name of the import (ex.: external_results).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field rules in evaluation order.
    pub fields: Vec<FieldDefinition>,
}

/// Rule for a single input column.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    /// Input column key as it appears in the raw records.
    pub key: String,
    /// Output key; defaults to `key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop: Option<String>,
    /// Group the output nests under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Expected type after parsing.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Allowed parsed values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<serde_json::Value>>,
    /// Named parser applied before validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParserRef>,
}

/// Parser reference; accepts a bare id or a full spec.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ParserRef {
    Id(String),
    Spec(ParserSpec),
}

/// Parser spec with optional params.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ParserSpec {
    pub id: String,
    /// Parser parameters (shape depends on the parser).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl ParserRef {
    pub fn id(&self) -> &str {
        match self {
            ParserRef::Id(value) => value.as_str(),
            ParserRef::Spec(spec) => spec.id.as_str(),
        }
    }

    pub fn params(&self) -> Option<&serde_json::Value> {
        match self {
            ParserRef::Id(_) => None,
            ParserRef::Spec(spec) => spec.params.as_ref(),
        }
    }
}

impl FieldDefinition {
    /// Output key for this field.
    pub fn output_key(&self) -> &str {
        self.prop.as_deref().unwrap_or(&self.key)
    }
}
