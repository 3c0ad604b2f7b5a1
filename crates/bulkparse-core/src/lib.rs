//! Schema-driven bulk record validation.
//!
//! A [`Schema`] maps input keys to [`FieldSchema`] rules. [`schema_parser`]
//! applies it to a batch of raw records and returns annotated records, parsed
//! records, a flat error list and the subset of records free of errors. All
//! failures are data; nothing here performs I/O or keeps global state.

pub mod engine;
pub mod error;
pub mod record;
pub mod schema;
pub mod validation;
pub mod value;

pub use engine::{RecordValidation, SchemaParseResult, parse_data_with_schema, schema_parser};
pub use error::{Error, Result};
pub use record::{
    AnnotatedRecord, Entry, ErrorEntry, ErrorKind, FieldError, FieldResult, Group, ParsedRecord,
    RawRecord, RecordMap,
};
pub use schema::{FieldSchema, FieldType, ParseError, ParseFn, Schema};
pub use validation::validate_and_parse;
pub use value::{Value, join_values};
