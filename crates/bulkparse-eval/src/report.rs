use bulkparse_core::ErrorEntry;

use crate::metrics::ImportMetrics;

/// Render a deterministic markdown report from metrics and error entries.
pub fn render_report(
    metrics: &ImportMetrics,
    errors: &[ErrorEntry],
    max_examples: usize,
) -> String {
    let mut lines = Vec::new();

    lines.push("# Bulk Import Report".to_string());
    lines.push(String::new());
    lines.push("## Summary".to_string());
    lines.push(format!("- records_total: {}", metrics.records_total));
    lines.push(format!("- records_clean: {}", metrics.records_clean));
    lines.push(format!("- records_rejected: {}", metrics.records_rejected));
    lines.push(format!("- records_with_errors: {}", metrics.records_with_errors));
    lines.push(format!("- errors_total: {}", metrics.errors_total));
    if let Some(performance) = &metrics.performance {
        lines.push(format!(
            "- timings_ms: load={} parse={} total={}",
            performance.load_ms, performance.parse_ms, performance.total_ms
        ));
    }
    lines.push(String::new());

    lines.push("## Fields".to_string());
    lines.push("| field | output | errors | null_values |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for field in &metrics.fields {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            field.key, field.output, field.errors, field.null_values
        ));
    }
    lines.push(String::new());

    if !metrics.errors_by_kind.is_empty() {
        lines.push("## Errors by kind".to_string());
        lines.push("| kind | count |".to_string());
        lines.push("| --- | --- |".to_string());
        for (kind, count) in &metrics.errors_by_kind {
            lines.push(format!("| {kind} | {count} |"));
        }
        lines.push(String::new());
    }

    if !errors.is_empty() {
        lines.push("## Top errors".to_string());
        for entry in errors.iter().take(max_examples) {
            lines.push(format!(
                "- row {} {}: {}",
                entry.index, entry.key, entry.error
            ));
        }
        if errors.len() > max_examples {
            lines.push(format!("- ... {} more", errors.len() - max_examples));
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(metrics));
    lines.join("\n")
}

fn recommendations(metrics: &ImportMetrics) -> Vec<String> {
    let mut lines = Vec::new();
    let count = |kind: &str| metrics.errors_by_kind.get(kind).copied().unwrap_or(0);

    if count("parse_failed") > 0 {
        lines.push(
            "- check parser params against the input formats (dates, numbers, phones).".to_string(),
        );
    }
    if count("type_mismatch") > 0 {
        lines.push("- add a parser for columns whose raw values arrive as text.".to_string());
    }
    if count("not_one_of") > 0 {
        lines.push(
            "- normalize case or extend one_of for columns with unexpected values.".to_string(),
        );
    }
    if count("required") > 0 {
        lines.push("- fill in required columns before re-importing.".to_string());
    }
    if metrics.records_with_errors > metrics.records_rejected {
        lines.push(
            "- grouped field errors do not reject a record; review nested values before persisting."
                .to_string(),
        );
    }
    if metrics.errors_total == 0 {
        lines.push("- no errors detected; every record is ready to persist.".to_string());
    }
    lines
}
