use std::collections::{HashMap, HashSet};
use std::path::Path;

use bulkparse_core::{FieldSchema, FieldType, Schema, Value};
use jsonschema::JSONSchema;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::errors::{DefinitionError, IssueSeverity, ValidationIssue, ValidationReport};
use crate::model::{DEFINITION_VERSION, FieldDefinition, ParserRef, SchemaDefinition};
use crate::parsers::ParserRegistry;

/// Validated definition with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedDefinition {
    pub definition: SchemaDefinition,
    pub warnings: Vec<ValidationIssue>,
}

/// Read a definition file as raw JSON.
pub fn load_definition_json(path: &Path) -> Result<JsonValue, DefinitionError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Validate a definition JSON document against the definition JSON Schema.
pub fn validate_definition_json(
    definition_json: &JsonValue,
    definition_schema: &JsonValue,
) -> Result<ValidationReport, DefinitionError> {
    let compiled = JSONSchema::compile(definition_schema)
        .map_err(|err| DefinitionError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(definition_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Semantic checks of a parsed definition against the parser registry.
pub fn validate_definition_against_registry(
    definition: &SchemaDefinition,
    registry: &ParserRegistry,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_header(definition, &mut report);
    validate_fields(&definition.fields, registry, &mut report);
    validate_outputs(&definition.fields, &mut report);

    report
}

/// Validate the definition end-to-end, returning structured issues on failure.
pub fn validate_definition(
    definition_json: &JsonValue,
    definition_schema: &JsonValue,
    registry: &ParserRegistry,
) -> Result<ValidatedDefinition, ValidationReport> {
    let structural = match validate_definition_json(definition_json, definition_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let definition: SchemaDefinition = match serde_json::from_value(definition_json.clone()) {
        Ok(definition) => definition,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_definition_json",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    let semantic = validate_definition_against_registry(&definition, registry);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    Ok(ValidatedDefinition {
        definition,
        warnings: semantic.warnings,
    })
}

/// Build a core schema from a definition, resolving named parsers.
pub fn compile_definition(
    definition: &SchemaDefinition,
    registry: &ParserRegistry,
) -> Result<Schema, DefinitionError> {
    let mut schema = Schema::new();

    for field in &definition.fields {
        let mut compiled = FieldSchema::new(field.field_type);
        compiled.prop = field.prop.clone();
        compiled.parent = field.parent.clone();
        compiled.required = field.required;
        compiled.one_of = field
            .one_of
            .as_ref()
            .map(|values| values.iter().cloned().map(Value::from).collect());
        if let Some(reference) = &field.parse {
            compiled = compiled.with_parse_fn(registry.resolve(reference)?);
        }

        debug!(
            key = %field.key,
            field_type = %field.field_type,
            parser = field.parse.as_ref().map(|reference| reference.id()).unwrap_or("-"),
            "field compiled"
        );
        schema.insert(field.key.clone(), compiled)?;
    }

    Ok(schema)
}

fn validate_header(definition: &SchemaDefinition, report: &mut ValidationReport) {
    if definition.definition_version != DEFINITION_VERSION {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "definition_version_mismatch",
            "/definition_version",
            format!(
                "definition_version '{}' is not supported (expected '{}')",
                definition.definition_version, DEFINITION_VERSION
            ),
            Some(format!("set definition_version to \"{DEFINITION_VERSION}\"")),
        ));
    }

    if definition.name.trim().is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "name_empty",
            "/name",
            "definition name cannot be empty".to_string(),
            None,
        ));
    }
}

fn validate_fields(
    fields: &[FieldDefinition],
    registry: &ParserRegistry,
    report: &mut ValidationReport,
) {
    if fields.is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "fields_empty",
            "/fields",
            "definition requires at least one field".to_string(),
            Some("add at least one field rule".to_string()),
        ));
        return;
    }

    let mut seen = HashSet::new();

    for (idx, field) in fields.iter().enumerate() {
        let base_path = format!("/fields/{idx}");

        if field.key.is_empty() {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "key_empty",
                format!("{base_path}/key"),
                "field key cannot be empty".to_string(),
                None,
            ));
        } else if !seen.insert(field.key.as_str()) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "duplicate_key",
                format!("{base_path}/key"),
                format!("field '{}' is declared more than once", field.key),
                Some("keep only one rule per input column".to_string()),
            ));
        }

        if field.prop.as_deref() == Some("") {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "prop_empty",
                format!("{base_path}/prop"),
                "prop cannot be empty".to_string(),
                Some("omit prop to reuse the field key".to_string()),
            ));
        }

        if field.parent.as_deref() == Some("") {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "parent_empty",
                format!("{base_path}/parent"),
                "parent cannot be empty".to_string(),
                Some("omit parent to keep the field at the top level".to_string()),
            ));
        }

        if let Some(reference) = &field.parse {
            validate_parser(reference, &base_path, registry, report);
        }

        if let Some(values) = &field.one_of {
            validate_one_of(values, field.field_type, &base_path, report);
        }
    }
}

fn validate_parser(
    reference: &ParserRef,
    base_path: &str,
    registry: &ParserRegistry,
    report: &mut ValidationReport,
) {
    match registry.resolve(reference) {
        Ok(_) => {}
        Err(DefinitionError::UnknownParser(_)) => {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "unknown_parser",
                format!("{base_path}/parse"),
                format!("parser '{}' is not registered", reference.id()),
                Some("run `bulkparse parsers` to list available parsers".to_string()),
            ));
        }
        Err(err) => {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_parser_params",
                format!("{base_path}/parse"),
                err.to_string(),
                None,
            ));
        }
    }
}

fn validate_one_of(
    values: &[JsonValue],
    field_type: FieldType,
    base_path: &str,
    report: &mut ValidationReport,
) {
    if values.is_empty() {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "one_of_empty",
            format!("{base_path}/one_of"),
            "one_of is empty; every non-empty value will be rejected".to_string(),
            Some("remove one_of or list the allowed values".to_string()),
        ));
        return;
    }

    for (idx, value) in values.iter().enumerate() {
        let value = Value::from(value.clone());
        if !field_type.accepts(&value) {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "one_of_type_mismatch",
                format!("{base_path}/one_of/{idx}"),
                format!(
                    "allowed value {} is a {}, not a {}",
                    value.to_display_string(),
                    value.type_name(),
                    field_type
                ),
                Some("this value can never match a parsed value of the declared type".to_string()),
            ));
        }
    }
}

fn validate_outputs(fields: &[FieldDefinition], report: &mut ValidationReport) {
    let mut slots: HashMap<(Option<&str>, &str), usize> = HashMap::new();
    let parents: HashSet<&str> = fields
        .iter()
        .filter_map(|field| field.parent.as_deref())
        .collect();

    for (idx, field) in fields.iter().enumerate() {
        let base_path = format!("/fields/{idx}");
        let slot = (field.parent.as_deref(), field.output_key());

        if let Some(first) = slots.get(&slot) {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "duplicate_output",
                base_path.clone(),
                format!(
                    "field '{}' writes the same output as /fields/{first}; the later field wins",
                    field.key
                ),
                Some("give one of the fields a distinct prop".to_string()),
            ));
        } else {
            slots.insert(slot, idx);
        }

        if field.parent.is_none() && parents.contains(field.output_key()) {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "prop_parent_collision",
                format!("{base_path}/prop"),
                format!(
                    "output '{}' is also used as a parent group",
                    field.output_key()
                ),
                Some(
                    "rename the prop or the parent so they do not overwrite each other"
                        .to_string(),
                ),
            ));
        }
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
