use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::value::Value;

/// Expected runtime type of a parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Objects, arrays and `null`.
    Object,
    /// Disables the type check.
    Any,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }

    /// Returns true when `value` satisfies this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Any => true,
            other => value.type_name() == other.as_str(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a field parse transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Transform applied to a raw value before validation.
pub type ParseFn = Arc<dyn Fn(&Value) -> std::result::Result<Value, ParseError> + Send + Sync>;

/// Validation and parse rule for one input field.
#[derive(Clone)]
pub struct FieldSchema {
    /// Output key; defaults to the input key.
    pub prop: Option<String>,
    /// Group key the output nests under.
    pub parent: Option<String>,
    pub field_type: FieldType,
    /// Closed set of allowed parsed values.
    pub one_of: Option<Vec<Value>>,
    pub required: bool,
    pub parse: Option<ParseFn>,
}

impl FieldSchema {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            prop: None,
            parent: None,
            field_type,
            one_of: None,
            required: false,
            parse: None,
        }
    }

    pub fn with_prop(mut self, prop: impl Into<String>) -> Self {
        self.prop = Some(prop.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, ParseError> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    pub fn with_parse_fn(mut self, parse: ParseFn) -> Self {
        self.parse = Some(parse);
        self
    }

    /// Output key for this field when declared under `key`.
    pub fn output_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.prop.as_deref().unwrap_or(key)
    }
}

impl fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("prop", &self.prop)
            .field("parent", &self.parent)
            .field("field_type", &self.field_type)
            .field("one_of", &self.one_of)
            .field("required", &self.required)
            .field("parse", &self.parse.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Ordered mapping from input field key to its rule.
///
/// Iteration follows declaration order. Re-inserting a key replaces the rule
/// but keeps the original position.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldSchema)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field rule, returning the previous rule for `key`.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        field: FieldSchema,
    ) -> Result<Option<FieldSchema>> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidSchema("field key cannot be empty".to_string()));
        }
        if field.prop.as_deref() == Some("") {
            return Err(Error::InvalidSchema(format!(
                "field '{key}' has an empty prop"
            )));
        }
        if field.parent.as_deref() == Some("") {
            return Err(Error::InvalidSchema(format!(
                "field '{key}' has an empty parent"
            )));
        }

        if let Some((_, existing)) = self.fields.iter_mut().find(|(name, _)| *name == key) {
            return Ok(Some(std::mem::replace(existing, field)));
        }
        self.fields.push((key, field));
        Ok(None)
    }

    /// Builder form of [`Schema::insert`].
    pub fn with_field(mut self, key: impl Into<String>, field: FieldSchema) -> Result<Self> {
        self.insert(key, field)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, field)| field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.as_str(), field))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
