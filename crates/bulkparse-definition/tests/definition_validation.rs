use std::fs;
use std::path::Path;

use bulkparse_core::{RawRecord, Value, schema_parser};
use bulkparse_definition::{
    ParserRegistry, SchemaDefinition, compile_definition, definition_json_schema_value,
    validate_definition, validate_definition_against_registry, validate_definition_json,
};
use serde_json::json;

fn load_json(path: &Path) -> serde_json::Value {
    let contents =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse json")
}

fn example_definition() -> serde_json::Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../definitions/examples/external_result.definition.json");
    load_json(&path)
}

fn definition(value: serde_json::Value) -> SchemaDefinition {
    serde_json::from_value(value).expect("parse definition")
}

fn codes(issues: &[bulkparse_definition::ValidationIssue]) -> Vec<&str> {
    issues.iter().map(|issue| issue.code.as_str()).collect()
}

#[test]
fn example_definition_validates_and_compiles() {
    let definition_schema = definition_json_schema_value().expect("emit definition schema");
    let registry = ParserRegistry::new();

    let validated = validate_definition(&example_definition(), &definition_schema, &registry)
        .expect("definition validation should succeed");
    assert!(validated.warnings.is_empty(), "unexpected warnings");

    let schema = compile_definition(&validated.definition, &registry).expect("compile");
    let keys: Vec<&str> = schema.keys().collect();
    assert_eq!(keys.len(), 13);
    assert_eq!(keys[0], "District");
    assert_eq!(keys[12], "Is Repeat");
}

#[test]
fn structural_errors_are_reported_with_paths() {
    let definition_schema = definition_json_schema_value().expect("emit definition schema");

    let report = validate_definition_json(
        &json!({"definition_version": "0.1", "name": "x"}),
        &definition_schema,
    )
    .expect("compile json schema");
    assert!(!report.is_ok());
    assert_eq!(report.errors[0].code, "schema_violation");

    let report = validate_definition_json(
        &json!({
            "definition_version": "0.1",
            "name": "x",
            "fields": [{"key": "a", "type": "integer"}]
        }),
        &definition_schema,
    )
    .expect("compile json schema");
    assert!(!report.is_ok());
    assert!(report.errors[0].path.starts_with("/fields/0"));
}

#[test]
fn misspelled_field_options_are_rejected() {
    let definition_schema = definition_json_schema_value().expect("emit definition schema");
    let value = json!({
        "definition_version": "0.1",
        "name": "x",
        "fields": [{"key": "grade", "type": "string", "oneOf": ["A", "B"]}]
    });

    let report = validate_definition_json(&value, &definition_schema).expect("compile json schema");
    assert_eq!(codes(&report.errors), vec!["schema_violation"]);
    assert!(report.errors[0].path.starts_with("/fields/0"));

    let report = validate_definition(&value, &definition_schema, &ParserRegistry::new())
        .expect_err("unknown option should fail");
    assert_eq!(report.errors[0].code, "schema_violation");
    assert!(serde_json::from_value::<SchemaDefinition>(value).is_err());

    let value = json!({
        "definition_version": "0.1",
        "name": "x",
        "fields": [{
            "key": "age",
            "type": "number",
            "parse": {"id": "parse.number", "param": {}}
        }]
    });
    let report = validate_definition_json(&value, &definition_schema).expect("compile json schema");
    assert!(!report.is_ok());
}

#[test]
fn unknown_parsers_and_bad_params_are_errors() {
    let registry = ParserRegistry::new();
    let report = validate_definition_against_registry(
        &definition(json!({
            "definition_version": "0.1",
            "name": "x",
            "fields": [
                {"key": "a", "type": "string", "parse": "parse.nope"},
                {"key": "b", "type": "string", "parse": {"id": "parse.trim", "params": {"x": 1}}},
                {
                    "key": "c",
                    "type": "string",
                    "parse": {"id": "parse.date", "params": {"format": 3}}
                }
            ]
        })),
        &registry,
    );

    assert_eq!(
        codes(&report.errors),
        vec!["unknown_parser", "invalid_parser_params", "invalid_parser_params"]
    );
    assert_eq!(report.errors[0].path, "/fields/0/parse");
}

#[test]
fn header_and_key_errors() {
    let registry = ParserRegistry::new();
    let report = validate_definition_against_registry(
        &definition(json!({
            "definition_version": "9.9",
            "name": " ",
            "fields": [
                {"key": "a", "type": "string"},
                {"key": "a", "type": "number", "prop": ""},
                {"key": "", "type": "any", "parent": ""}
            ]
        })),
        &registry,
    );

    assert_eq!(
        codes(&report.errors),
        vec![
            "definition_version_mismatch",
            "name_empty",
            "duplicate_key",
            "prop_empty",
            "key_empty",
            "parent_empty"
        ]
    );

    let report = validate_definition_against_registry(
        &definition(json!({"definition_version": "0.1", "name": "x", "fields": []})),
        &registry,
    );
    assert_eq!(codes(&report.errors), vec!["fields_empty"]);
}

#[test]
fn suspicious_rules_produce_warnings() {
    let registry = ParserRegistry::new();
    let report = validate_definition_against_registry(
        &definition(json!({
            "definition_version": "0.1",
            "name": "x",
            "fields": [
                {"key": "grade", "type": "string", "one_of": ["A", 1]},
                {"key": "level", "type": "string", "prop": "grade"},
                {"key": "ward", "type": "number", "parent": "address"},
                {"key": "address", "type": "string"},
                {"key": "flag", "type": "boolean", "one_of": []}
            ]
        })),
        &registry,
    );

    assert!(report.is_ok());
    assert_eq!(
        codes(&report.warnings),
        vec![
            "one_of_type_mismatch",
            "one_of_empty",
            "duplicate_output",
            "prop_parent_collision"
        ]
    );
    assert_eq!(report.warnings[0].path, "/fields/0/one_of/1");
}

#[test]
fn compiled_definition_drives_the_engine() {
    let registry = ParserRegistry::new();
    let schema = compile_definition(
        &definition(json!({
            "definition_version": "0.1",
            "name": "patients",
            "fields": [
                {
                    "key": "Name",
                    "prop": "name",
                    "type": "string",
                    "required": true,
                    "parse": "parse.trim"
                },
                {"key": "Age", "prop": "age", "type": "number", "parse": "parse.integer"},
                {
                    "key": "Gender",
                    "prop": "gender",
                    "type": "string",
                    "one_of": ["Male", "Female", "Other"]
                },
                {
                    "key": "Ward",
                    "prop": "ward",
                    "parent": "address",
                    "type": "number",
                    "parse": "parse.number"
                }
            ]
        })),
        &registry,
    )
    .expect("compile definition");

    let records: Vec<RawRecord> = serde_json::from_value(json!([
        {"Name": " Asha ", "Age": "34", "Gender": "Female", "Ward": "12"},
        {"Name": "   ", "Age": "4.5", "Gender": "F"}
    ]))
    .expect("parse records");

    let result = schema_parser(&records, &schema);
    assert_eq!(
        serde_json::to_value(&result.parsed_data_without_errors).expect("serialize"),
        json!([{"name": "Asha", "age": 34, "gender": "Female", "address": {"ward": 12}}])
    );

    let messages: Vec<&str> = result.errors.iter().map(|entry| entry.error.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Name should be of type string",
            "4.5 is not an integer",
            "Gender should be one of the Male,Female,Other"
        ]
    );
    let ward = result.parsed_data[1].nested("address", "ward").expect("ward");
    assert!(ward.as_f64().is_some_and(f64::is_nan));
    assert_eq!(
        result.data_with_errors[1].field("age").map(|r| &r.value),
        Some(&Value::from("4.5"))
    );
}
