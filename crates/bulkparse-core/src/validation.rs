use crate::record::{ErrorKind, FieldResult};
use crate::schema::FieldSchema;
use crate::value::{Value, join_values};

/// Validate and parse one raw value against its field rule.
///
/// Checks run in a fixed order and the first failing check wins:
/// - parse transform (a failure keeps the original raw value)
/// - optional nullish short-circuit
/// - type
/// - allowed values
/// - required
///
/// A required field holding `null`/`undefined` with a concrete type therefore
/// reports the type error, not "is required". Empty strings are not missing.
pub fn validate_and_parse(key: &str, raw: &Value, field: &FieldSchema) -> FieldResult {
    let value = match &field.parse {
        Some(parse) => match parse(raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                return FieldResult::invalid(raw.clone(), ErrorKind::ParseFailed, err.message());
            }
        },
        None => raw.clone(),
    };

    if value.is_nullish() && !field.required {
        return FieldResult::valid(value);
    }

    if !field.field_type.accepts(&value) {
        let message = format!("{key} should be of type {}", field.field_type);
        return FieldResult::invalid(value, ErrorKind::TypeMismatch, message);
    }

    if let Some(allowed) = &field.one_of {
        if !allowed.iter().any(|candidate| candidate.same_value_zero(&value)) {
            let message = format!("{key} should be one of the {}", join_values(allowed));
            return FieldResult::invalid(value, ErrorKind::NotOneOf, message);
        }
    }

    if field.required && value.is_nullish() {
        let message = format!("{key} is required");
        return FieldResult::invalid(value, ErrorKind::Required, message);
    }

    FieldResult::valid(value)
}
