use std::env;
use std::path::PathBuf;

use bulkparse_definition::{
    ParserRegistry, ValidationReport, definition_json_schema_value, load_definition_json,
    validate_definition,
};
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let mut definition_path: Option<PathBuf> = None;
    let mut definition_schema_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--definition-schema" => {
                definition_schema_path = args.next().map(PathBuf::from);
            }
            _ => {
                if definition_path.is_none() {
                    definition_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let definition_path = definition_path.ok_or("missing definition path")?;
    let definition_json = load_definition_json(&definition_path)?;
    let definition_schema = match definition_schema_path {
        Some(path) => load_definition_json(&path)?,
        None => definition_json_schema_value()?,
    };

    let registry = ParserRegistry::new();
    let validated = match validate_definition(&definition_json, &definition_schema, &registry) {
        Ok(validated) => validated,
        Err(report) => {
            eprintln!("definition validation failed");
            print_report(&report);
            std::process::exit(1);
        }
    };

    if !validated.warnings.is_empty() {
        eprintln!("definition validated with warnings:");
        print_report(&ValidationReport {
            errors: Vec::new(),
            warnings: validated.warnings,
        });
    } else {
        println!("definition validated successfully");
    }

    Ok(())
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
    for issue in &report.warnings {
        eprintln!("warning {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
