use std::collections::BTreeMap;
use std::sync::Arc;

use bulkparse_core::{ParseError, ParseFn, Value};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::errors::{DefinitionError, Result};
use crate::model::ParserRef;

const PHONE_PATTERN: &str = r"^\+?[0-9]{10,15}$";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A named parse transform that can be referenced from definition files.
pub trait Parser: Send + Sync {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Build the parse function for the given params.
    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn>;
}

/// Registry of named parsers.
pub struct ParserRegistry {
    parsers: BTreeMap<&'static str, Box<dyn Parser>>,
}

impl ParserRegistry {
    /// Registry with every built-in parser.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(NumberParser));
        registry.register(Box::new(IntegerParser));
        registry.register(Box::new(StringParser));
        registry.register(Box::new(TrimParser));
        registry.register(Box::new(CaseParser { upper: false }));
        registry.register(Box::new(CaseParser { upper: true }));
        registry.register(Box::new(BooleanParser));
        registry.register(Box::new(DateParser));
        registry.register(Box::new(PhoneParser));
        registry.register(Box::new(SplitParser));
        registry.register(Box::new(NullIfEmptyParser));
        registry
    }

    pub fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Register a parser, replacing any parser with the same id.
    pub fn register(&mut self, parser: Box<dyn Parser>) {
        self.parsers.insert(parser.id(), parser);
    }

    pub fn get(&self, id: &str) -> Option<&dyn Parser> {
        self.parsers.get(id).map(|parser| parser.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parsers.contains_key(id)
    }

    /// Registered parsers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Parser> {
        self.parsers.values().map(|parser| parser.as_ref())
    }

    pub fn resolve(&self, reference: &ParserRef) -> Result<ParseFn> {
        let parser = self
            .get(reference.id())
            .ok_or_else(|| DefinitionError::UnknownParser(reference.id().to_string()))?;
        parser.build(reference.params())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric conversion with `Number(value)` semantics.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(value) => {
            if *value {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(value) => *value,
        Value::String(text) => number_from_str(text),
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => number_from_str(&single.to_display_string()),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

fn number_from_str(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return number_from_radix(digits, radix);
        }
    }

    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if numeric {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

// Unsigned digits only; values past u64 keep accumulating as f64.
fn number_from_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut value = 0.0_f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(digit) => value = value * f64::from(radix) + f64::from(digit),
            None => return f64::NAN,
        }
    }
    value
}

fn parse_fn<F>(parse: F) -> ParseFn
where
    F: Fn(&Value) -> std::result::Result<Value, ParseError> + Send + Sync + 'static,
{
    Arc::new(parse)
}

fn reject_params(id: &str, params: Option<&JsonValue>) -> Result<()> {
    match params {
        None | Some(JsonValue::Null) => Ok(()),
        Some(JsonValue::Object(map)) if map.is_empty() => Ok(()),
        Some(_) => Err(DefinitionError::InvalidParams(format!(
            "{id} does not accept params"
        ))),
    }
}

fn string_param(id: &str, params: Option<&JsonValue>, name: &str) -> Result<Option<String>> {
    let Some(value) = params.and_then(|params| params.get(name)) else {
        return Ok(None);
    };
    value
        .as_str()
        .map(|value| Some(value.to_string()))
        .ok_or_else(|| DefinitionError::InvalidParams(format!("{id} {name} must be a string")))
}

struct NumberParser;

impl Parser for NumberParser {
    fn id(&self) -> &'static str {
        "parse.number"
    }

    fn description(&self) -> &'static str {
        "convert to a number; blank text becomes 0 and unparseable text NaN"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        reject_params(self.id(), params)?;
        Ok(parse_fn(|value: &Value| Ok(Value::Number(to_number(value)))))
    }
}

struct IntegerParser;

impl Parser for IntegerParser {
    fn id(&self) -> &'static str {
        "parse.integer"
    }

    fn description(&self) -> &'static str {
        "convert to a whole number"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        reject_params(self.id(), params)?;
        Ok(parse_fn(|value: &Value| {
            if value.is_nullish() {
                return Ok(value.clone());
            }
            let number = to_number(value);
            if number.is_finite() && number.fract() == 0.0 {
                Ok(Value::Number(number))
            } else {
                Err(ParseError::new(format!(
                    "{} is not an integer",
                    value.to_display_string()
                )))
            }
        }))
    }
}

struct StringParser;

impl Parser for StringParser {
    fn id(&self) -> &'static str {
        "parse.string"
    }

    fn description(&self) -> &'static str {
        "convert to text"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        reject_params(self.id(), params)?;
        Ok(parse_fn(|value: &Value| {
            if value.is_nullish() {
                Ok(value.clone())
            } else {
                Ok(Value::String(value.to_display_string()))
            }
        }))
    }
}

struct TrimParser;

impl Parser for TrimParser {
    fn id(&self) -> &'static str {
        "parse.trim"
    }

    fn description(&self) -> &'static str {
        "trim surrounding whitespace; blank text becomes undefined"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        reject_params(self.id(), params)?;
        Ok(parse_fn(|value: &Value| match value {
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Ok(Value::Undefined)
                } else {
                    Ok(Value::String(trimmed.to_string()))
                }
            }
            other => Ok(other.clone()),
        }))
    }
}

struct CaseParser {
    upper: bool,
}

impl Parser for CaseParser {
    fn id(&self) -> &'static str {
        if self.upper {
            "parse.uppercase"
        } else {
            "parse.lowercase"
        }
    }

    fn description(&self) -> &'static str {
        if self.upper {
            "upper-case text"
        } else {
            "lower-case text"
        }
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        reject_params(self.id(), params)?;
        let upper = self.upper;
        Ok(parse_fn(move |value: &Value| match value {
            Value::String(text) if upper => Ok(Value::String(text.to_uppercase())),
            Value::String(text) => Ok(Value::String(text.to_lowercase())),
            other => Ok(other.clone()),
        }))
    }
}

struct BooleanParser;

impl Parser for BooleanParser {
    fn id(&self) -> &'static str {
        "parse.boolean"
    }

    fn description(&self) -> &'static str {
        "map true/yes/y/1 and false/no/n/0 to booleans"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        reject_params(self.id(), params)?;
        Ok(parse_fn(|value: &Value| {
            let parsed = match value {
                Value::Undefined | Value::Null | Value::Bool(_) => return Ok(value.clone()),
                Value::Number(number) if *number == 1.0 => Some(true),
                Value::Number(number) if *number == 0.0 => Some(false),
                Value::String(text) => match text.trim().to_lowercase().as_str() {
                    "true" | "yes" | "y" | "1" => Some(true),
                    "false" | "no" | "n" | "0" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            parsed.map(Value::Bool).ok_or_else(|| {
                ParseError::new(format!("{} is not a boolean", value.to_display_string()))
            })
        }))
    }
}

struct DateParser;

impl Parser for DateParser {
    fn id(&self) -> &'static str {
        "parse.date"
    }

    fn description(&self) -> &'static str {
        "parse a date with params.format (default %Y-%m-%d) into YYYY-MM-DD"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        let format = string_param(self.id(), params, "format")?
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
        Ok(parse_fn(move |value: &Value| match value {
            Value::String(text) => NaiveDate::parse_from_str(text.trim(), &format)
                .map(|date| Value::String(date.format(DEFAULT_DATE_FORMAT).to_string()))
                .map_err(|_| ParseError::new(format!("{text} is not a valid date"))),
            Value::Undefined | Value::Null => Ok(value.clone()),
            other => Err(ParseError::new(format!(
                "{} is not a valid date",
                other.to_display_string()
            ))),
        }))
    }
}

struct PhoneParser;

impl Parser for PhoneParser {
    fn id(&self) -> &'static str {
        "parse.phone"
    }

    fn description(&self) -> &'static str {
        "normalize a phone number; params.country_code prefixes 10-digit numbers"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        let country_code = string_param(self.id(), params, "country_code")?;
        let pattern = Regex::new(PHONE_PATTERN)
            .map_err(|err| DefinitionError::InvalidParams(err.to_string()))?;
        Ok(parse_fn(move |value: &Value| {
            if value.is_nullish() {
                return Ok(value.clone());
            }
            let text = value.to_display_string();
            let compact: String = text
                .chars()
                .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
                .collect();
            if !pattern.is_match(&compact) {
                return Err(ParseError::new(format!(
                    "{text} is not a valid phone number"
                )));
            }
            match &country_code {
                Some(code) if !compact.starts_with('+') && compact.len() == 10 => {
                    Ok(Value::String(format!("{code}{compact}")))
                }
                _ => Ok(Value::String(compact)),
            }
        }))
    }
}

struct SplitParser;

impl Parser for SplitParser {
    fn id(&self) -> &'static str {
        "parse.split"
    }

    fn description(&self) -> &'static str {
        "split text on params.separator (default ',') into a list"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        let separator =
            string_param(self.id(), params, "separator")?.unwrap_or_else(|| ",".to_string());
        if separator.is_empty() {
            return Err(DefinitionError::InvalidParams(
                "parse.split separator cannot be empty".to_string(),
            ));
        }
        Ok(parse_fn(move |value: &Value| match value {
            Value::String(text) => Ok(Value::Array(
                text.split(separator.as_str())
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(Value::from)
                    .collect(),
            )),
            other => Ok(other.clone()),
        }))
    }
}

struct NullIfEmptyParser;

impl Parser for NullIfEmptyParser {
    fn id(&self) -> &'static str {
        "parse.null_if_empty"
    }

    fn description(&self) -> &'static str {
        "turn blank text into null"
    }

    fn build(&self, params: Option<&JsonValue>) -> Result<ParseFn> {
        reject_params(self.id(), params)?;
        Ok(parse_fn(|value: &Value| match value {
            Value::String(text) if text.trim().is_empty() => Ok(Value::Null),
            other => Ok(other.clone()),
        }))
    }
}
