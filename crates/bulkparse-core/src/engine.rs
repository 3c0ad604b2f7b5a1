use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::record::{AnnotatedRecord, ErrorEntry, ParsedRecord, RawRecord};
use crate::schema::Schema;
use crate::validation::validate_and_parse;
use crate::value::Value;

/// Per-record outputs of a batch validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordValidation {
    pub data_with_errors: Vec<AnnotatedRecord>,
    pub parsed_data: Vec<ParsedRecord>,
    pub errors: Vec<ErrorEntry>,
}

/// Full result of [`schema_parser`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaParseResult {
    pub data_with_errors: Vec<AnnotatedRecord>,
    pub parsed_data: Vec<ParsedRecord>,
    pub errors: Vec<ErrorEntry>,
    /// Parsed records whose annotated record has no top-level error.
    pub parsed_data_without_errors: Vec<ParsedRecord>,
}

impl SchemaParseResult {
    /// Record indices that appear at least once in `errors`.
    pub fn rejected_indices(&self) -> BTreeSet<usize> {
        self.errors.iter().map(|entry| entry.index).collect()
    }
}

/// Apply `schema` to every record, preserving input order.
///
/// Every schema key contributes exactly one entry to every record, whether or
/// not the record carries that key.
pub fn parse_data_with_schema(records: &[RawRecord], schema: &Schema) -> RecordValidation {
    let mut data_with_errors = Vec::with_capacity(records.len());
    let mut parsed_data = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    let undefined = Value::Undefined;

    for (index, record) in records.iter().enumerate() {
        let mut annotated = AnnotatedRecord::new();
        let mut parsed = ParsedRecord::new();

        for (key, field) in schema.iter() {
            let raw = record.get(key).unwrap_or(&undefined);
            let result = validate_and_parse(key, raw, field);

            if result.has_error() {
                if let Some(error) = &result.error {
                    errors.push(ErrorEntry {
                        index,
                        key: key.to_string(),
                        error: error.message.clone(),
                        kind: error.kind,
                    });
                }
            }

            let prop = field.output_key(key);
            let value = result.value.clone();
            match field.parent.as_deref() {
                Some(parent) => {
                    annotated.set_in_group(parent, prop, result);
                    parsed.set_in_group(parent, prop, value);
                }
                None => {
                    annotated.set_field(prop, result);
                    parsed.set_field(prop, value);
                }
            }
        }

        data_with_errors.push(annotated);
        parsed_data.push(parsed);
    }

    RecordValidation {
        data_with_errors,
        parsed_data,
        errors,
    }
}

/// Validate a batch and split out the records that are safe to persist.
pub fn schema_parser(records: &[RawRecord], schema: &Schema) -> SchemaParseResult {
    let RecordValidation {
        data_with_errors,
        parsed_data,
        errors,
    } = parse_data_with_schema(records, schema);

    let parsed_data_without_errors: Vec<ParsedRecord> = parsed_data
        .iter()
        .zip(&data_with_errors)
        .filter(|(_, annotated)| !annotated.has_top_level_error())
        .map(|(parsed, _)| parsed.clone())
        .collect();

    debug!(
        records = records.len(),
        fields = schema.len(),
        errors = errors.len(),
        clean = parsed_data_without_errors.len(),
        "schema parse finished"
    );

    SchemaParseResult {
        data_with_errors,
        parsed_data,
        errors,
        parsed_data_without_errors,
    }
}
