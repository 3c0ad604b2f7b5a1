use bulkparse_core::Value;
use bulkparse_definition::{DefinitionError, ParserRef, ParserRegistry, ParserSpec, to_number};
use serde_json::json;

fn build(id: &str, params: Option<serde_json::Value>) -> bulkparse_core::ParseFn {
    let reference = match params {
        Some(params) => ParserRef::Spec(ParserSpec {
            id: id.to_string(),
            params: Some(params),
        }),
        None => ParserRef::Id(id.to_string()),
    };
    ParserRegistry::new()
        .resolve(&reference)
        .unwrap_or_else(|err| panic!("resolve {id}: {err}"))
}

#[test]
fn registry_lists_builtin_parsers_in_id_order() {
    let registry = ParserRegistry::new();
    let ids: Vec<&str> = registry.iter().map(|parser| parser.id()).collect();
    assert_eq!(
        ids,
        vec![
            "parse.boolean",
            "parse.date",
            "parse.integer",
            "parse.lowercase",
            "parse.null_if_empty",
            "parse.number",
            "parse.phone",
            "parse.split",
            "parse.string",
            "parse.trim",
            "parse.uppercase"
        ]
    );
    assert!(registry.iter().all(|parser| !parser.description().is_empty()));
    assert!(!ParserRegistry::empty().contains("parse.number"));
}

#[test]
fn unknown_parser_is_an_error() {
    let err = ParserRegistry::new()
        .resolve(&ParserRef::Id("parse.nope".to_string()))
        .err()
        .expect("unknown parser");
    assert!(matches!(err, DefinitionError::UnknownParser(id) if id == "parse.nope"));
}

#[test]
fn number_conversion_follows_number_semantics() {
    assert_eq!(to_number(&Value::from("42")), 42.0);
    assert_eq!(to_number(&Value::from("  ")), 0.0);
    assert_eq!(to_number(&Value::from("0x1A")), 26.0);
    assert_eq!(to_number(&Value::from("1e3")), 1000.0);
    assert_eq!(to_number(&Value::Null), 0.0);
    assert_eq!(to_number(&Value::Bool(true)), 1.0);
    assert_eq!(to_number(&Value::from("-Infinity")), f64::NEG_INFINITY);
    assert!(to_number(&Value::from("12abc")).is_nan());
    assert!(to_number(&Value::Undefined).is_nan());
    assert_eq!(to_number(&Value::from("0b101")), 5.0);
    assert_eq!(to_number(&Value::from("0x10000000000000000")), 18446744073709551616.0);
    assert!(to_number(&Value::from("0x+1")).is_nan());
    assert!(to_number(&Value::from("0x")).is_nan());
    assert!(to_number(&Value::from("0o19")).is_nan());

    let parse = build("parse.number", None);
    assert_eq!(parse(&Value::from("7.5")).expect("number"), Value::from(7.5));
}

#[test]
fn integer_rejects_fractions_and_text() {
    let parse = build("parse.integer", None);
    assert_eq!(parse(&Value::from("34")).expect("integer"), Value::from(34));
    assert_eq!(parse(&Value::Undefined).expect("undefined"), Value::Undefined);

    let err = parse(&Value::from("4.5")).expect_err("fraction");
    assert_eq!(err.message(), "4.5 is not an integer");
    let err = parse(&Value::from("forty")).expect_err("text");
    assert_eq!(err.message(), "forty is not an integer");
}

#[test]
fn text_parsers() {
    let trim = build("parse.trim", None);
    assert_eq!(trim(&Value::from("  Asha ")).expect("trim"), Value::from("Asha"));
    assert_eq!(trim(&Value::from("   ")).expect("blank"), Value::Undefined);
    assert_eq!(trim(&Value::from(3)).expect("number"), Value::from(3));

    let upper = build("parse.uppercase", None);
    assert_eq!(upper(&Value::from("negative")).expect("upper"), Value::from("NEGATIVE"));
    let lower = build("parse.lowercase", None);
    assert_eq!(lower(&Value::from("Years")).expect("lower"), Value::from("years"));

    let string = build("parse.string", None);
    assert_eq!(string(&Value::from(12)).expect("string"), Value::from("12"));
    assert_eq!(string(&Value::Null).expect("null"), Value::Null);

    let null_if_empty = build("parse.null_if_empty", None);
    assert_eq!(null_if_empty(&Value::from(" ")).expect("blank"), Value::Null);
    assert_eq!(null_if_empty(&Value::from("x")).expect("text"), Value::from("x"));
}

#[test]
fn boolean_accepts_common_spellings() {
    let parse = build("parse.boolean", None);
    assert_eq!(parse(&Value::from("Yes")).expect("yes"), Value::Bool(true));
    assert_eq!(parse(&Value::from("n")).expect("n"), Value::Bool(false));
    assert_eq!(parse(&Value::from(1)).expect("one"), Value::Bool(true));
    assert_eq!(parse(&Value::Undefined).expect("undefined"), Value::Undefined);

    let err = parse(&Value::from("maybe")).expect_err("maybe");
    assert_eq!(err.message(), "maybe is not a boolean");
}

#[test]
fn date_uses_the_configured_format() {
    let parse = build("parse.date", Some(json!({"format": "%d-%m-%Y"})));
    assert_eq!(
        parse(&Value::from("04-08-2020")).expect("date"),
        Value::from("2020-08-04")
    );
    let err = parse(&Value::from("31-02-2020")).expect_err("invalid day");
    assert_eq!(err.message(), "31-02-2020 is not a valid date");

    let iso = build("parse.date", None);
    assert_eq!(iso(&Value::from("2020-08-04")).expect("iso"), Value::from("2020-08-04"));
}

#[test]
fn phone_normalizes_and_prefixes_country_code() {
    let parse = build("parse.phone", Some(json!({"country_code": "+91"})));
    assert_eq!(
        parse(&Value::from("98470 12345")).expect("local"),
        Value::from("+919847012345")
    );
    assert_eq!(
        parse(&Value::from("+91-98470-00000")).expect("international"),
        Value::from("+919847000000")
    );
    let err = parse(&Value::from("12345")).expect_err("short");
    assert_eq!(err.message(), "12345 is not a valid phone number");
}

#[test]
fn split_produces_trimmed_parts() {
    let parse = build("parse.split", Some(json!({"separator": ";"})));
    assert_eq!(
        parse(&Value::from("a; b;;c ")).expect("split"),
        Value::Array(vec![Value::from("a"), Value::from("b"), Value::from("c")])
    );
}

#[test]
fn invalid_params_are_rejected() {
    let registry = ParserRegistry::new();
    let cases = [
        json!({"id": "parse.trim", "params": {"x": 1}}),
        json!({"id": "parse.date", "params": {"format": 1}}),
        json!({"id": "parse.split", "params": {"separator": ""}}),
    ];
    for case in cases {
        let reference: ParserRef = serde_json::from_value(case).expect("parser ref");
        let err = registry.resolve(&reference).err().expect("invalid params");
        assert!(matches!(err, DefinitionError::InvalidParams(_)));
    }
}
