use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bulkparse_core::{RawRecord, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported input: {0}")]
    Unsupported(String),
}

/// Record file formats accepted by `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("json") => Ok(InputFormat::Json),
            _ => Err(InputError::Unsupported(format!(
                "{} (expected .csv or .json)",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Json => "json",
        }
    }
}

/// Load raw records from a CSV or JSON file.
pub fn load_records(path: &Path) -> Result<(InputFormat, Vec<RawRecord>), InputError> {
    let format = InputFormat::from_path(path)?;
    let file = File::open(path)?;
    let records = match format {
        InputFormat::Csv => read_csv(file)?,
        InputFormat::Json => read_json(file)?,
    };
    Ok((format, records))
}

/// Header row gives the keys; empty cells are left out of the record.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(header, cell)| (header.to_string(), Value::from(cell)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Expects a top-level array of objects.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<RawRecord>, InputError> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    let serde_json::Value::Array(items) = value else {
        return Err(InputError::Unsupported(
            "JSON input must be an array of objects".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect()),
            _ => Err(InputError::Unsupported(format!(
                "JSON record {index} is not an object"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_headers_become_keys_and_empty_cells_are_absent() {
        let data = "Name,Age,Ward\nAsha,34,\nRavi,,7\n";
        let records = read_csv(data.as_bytes()).expect("read csv");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Name"), Some(&Value::from("Asha")));
        assert_eq!(records[0].get("Age"), Some(&Value::from("34")));
        assert!(!records[0].contains_key("Ward"));
        assert!(!records[1].contains_key("Age"));
    }

    #[test]
    fn short_csv_rows_are_accepted() {
        let records = read_csv("a,b,c\n1\n".as_bytes()).expect("read csv");
        assert_eq!(records[0].len(), 1);
    }

    #[test]
    fn json_keeps_value_types() {
        let data = r#"[{"Name": "Asha", "Age": 34, "Tags": ["a"], "Note": null}]"#;
        let records = read_json(data.as_bytes()).expect("read json");

        assert_eq!(records[0].get("Age"), Some(&Value::from(34)));
        assert_eq!(records[0].get("Note"), Some(&Value::Null));
        assert_eq!(
            records[0].get("Tags"),
            Some(&Value::Array(vec![Value::from("a")]))
        );
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(matches!(
            read_json(r#"{"Name": "Asha"}"#.as_bytes()),
            Err(InputError::Unsupported(_))
        ));
        assert!(matches!(
            read_json("[1]".as_bytes()),
            Err(InputError::Unsupported(_))
        ));
    }

    #[test]
    fn format_comes_from_the_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("batch.CSV")).expect("csv"),
            InputFormat::Csv
        );
        assert!(InputFormat::from_path(Path::new("batch.xlsx")).is_err());
    }
}
