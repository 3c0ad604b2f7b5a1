use bulkparse_definition::definition_json_schema;

fn main() {
    let schema = definition_json_schema();
    let json = serde_json::to_string_pretty(&schema).expect("serialize definition json schema");
    println!("{json}");
}
