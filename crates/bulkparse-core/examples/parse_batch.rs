use bulkparse_core::{FieldSchema, FieldType, ParseError, RawRecord, Schema, Value, schema_parser};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::new()
        .with_field("Name", FieldSchema::new(FieldType::String).with_prop("name").required())?
        .with_field(
            "Age",
            FieldSchema::new(FieldType::Number)
                .with_prop("age")
                .with_parse(|value| match value {
                    Value::String(text) => text
                        .trim()
                        .parse::<f64>()
                        .map(Value::Number)
                        .map_err(|_| ParseError::new(format!("{text} is not a number"))),
                    other => Ok(other.clone()),
                }),
        )?
        .with_field(
            "Gender",
            FieldSchema::new(FieldType::String)
                .with_prop("gender")
                .with_one_of(["Male", "Female", "Other"]),
        )?;

    let records: Vec<RawRecord> = serde_json::from_str(
        r#"[
            {"Name": "Asha", "Age": "34", "Gender": "Female"},
            {"Name": "Ravi", "Age": "forty", "Gender": "M"}
        ]"#,
    )?;

    let result = schema_parser(&records, &schema);
    for entry in &result.errors {
        println!("row {} {}: {}", entry.index, entry.key, entry.error);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&result.parsed_data_without_errors)?
    );
    Ok(())
}
