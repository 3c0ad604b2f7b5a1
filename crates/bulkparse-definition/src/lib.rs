//! Declarative import definitions.
//!
//! A definition file describes the columns of a bulk import. It is checked
//! against its JSON Schema, validated against the parser registry and
//! compiled into a `bulkparse_core::Schema`.

pub mod errors;
pub mod model;
pub mod parsers;
pub mod schema;
pub mod validate;

pub use errors::{DefinitionError, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use model::{DEFINITION_VERSION, FieldDefinition, ParserRef, ParserSpec, SchemaDefinition};
pub use parsers::{Parser, ParserRegistry, to_number};
pub use schema::{definition_json_schema, definition_json_schema_value};
pub use validate::{
    ValidatedDefinition, compile_definition, load_definition_json, validate_definition,
    validate_definition_against_registry, validate_definition_json,
};
