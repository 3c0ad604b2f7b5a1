use bulkparse_core::{Value, join_values};
use serde_json::json;

#[test]
fn type_names_follow_typeof() {
    assert_eq!(Value::Undefined.type_name(), "undefined");
    assert_eq!(Value::Null.type_name(), "object");
    assert_eq!(Value::from(true).type_name(), "boolean");
    assert_eq!(Value::Number(f64::NAN).type_name(), "number");
    assert_eq!(Value::from("a").type_name(), "string");
    assert_eq!(Value::Array(Vec::new()).type_name(), "object");
}

#[test]
fn display_strings_match_string_conversion() {
    assert_eq!(Value::from(30).to_display_string(), "30");
    assert_eq!(Value::from(-0.0).to_display_string(), "0");
    assert_eq!(Value::from(2.5).to_display_string(), "2.5");
    assert_eq!(Value::Number(f64::NAN).to_display_string(), "NaN");
    assert_eq!(Value::Number(f64::NEG_INFINITY).to_display_string(), "-Infinity");
    assert_eq!(Value::Null.to_display_string(), "null");
    assert_eq!(Value::from(1e21).to_display_string(), "1e+21");
    assert_eq!(Value::from(-1.5e22).to_display_string(), "-1.5e+22");
    assert_eq!(Value::from(1e20).to_display_string(), "100000000000000000000");
    assert_eq!(Value::from(1e-7).to_display_string(), "1e-7");
    assert_eq!(Value::from(1.25e-7).to_display_string(), "1.25e-7");
    assert_eq!(Value::from(0.000001).to_display_string(), "0.000001");
    assert_eq!(Value::from(0.1 + 0.2).to_display_string(), "0.30000000000000004");
    assert_eq!(Value::from(123.456).to_display_string(), "123.456");
    assert_eq!(
        join_values(&[Value::from("a"), Value::Undefined, Value::from(2)]),
        "a,,2"
    );
}

#[test]
fn objects_keep_member_order() {
    let value: Value =
        serde_json::from_str(r#"{"zeta": 1, "alpha": {"y": 2, "x": 3}}"#).expect("parse value");

    assert_eq!(
        serde_json::to_string(&value).expect("serialize value"),
        r#"{"zeta":1,"alpha":{"y":2,"x":3}}"#
    );
    assert_eq!(value.get("alpha").and_then(|alpha| alpha.get("x")), Some(&Value::from(3)));
    assert_eq!(Value::from("alpha").get("alpha"), None);
}

#[test]
fn json_conversion_normalizes_numbers() {
    let value = Value::from(json!({"age": 30, "score": 1.5, "tags": ["a", null]}));
    assert_eq!(
        serde_json::to_value(&value).expect("serialize value"),
        json!({"age": 30, "score": 1.5, "tags": ["a", null]})
    );

    assert_eq!(Value::Number(f64::NAN).to_json(), json!(null));
    assert_eq!(Value::Undefined.to_json(), json!(null));
    assert_eq!(Value::from(30.0).to_json(), json!(30));
}

#[test]
fn deserializes_from_json_text() {
    let value: Value = serde_json::from_str(r#"{"name": "Al", "age": 30}"#).expect("parse value");
    assert_eq!(value.type_name(), "object");
    assert_eq!(value.get("name"), Some(&Value::from("Al")));
    assert_eq!(value.get("age"), Some(&Value::from(30)));
}
