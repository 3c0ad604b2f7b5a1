use std::collections::BTreeMap;

use bulkparse_core::{ParsedRecord, Schema, SchemaParseResult};
use serde::{Deserialize, Serialize};

/// Metrics contract version for import runs.
pub const METRICS_VERSION: &str = "0.1";

/// Machine-readable metrics for one schema parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportMetrics {
    pub metrics_version: String,
    pub records_total: u64,
    /// Records that made it into the clean set.
    pub records_clean: u64,
    /// Records dropped from the clean set.
    pub records_rejected: u64,
    /// Records with at least one error entry, nested errors included.
    pub records_with_errors: u64,
    pub errors_total: u64,
    pub errors_by_kind: BTreeMap<String, u64>,
    pub fields: Vec<FieldMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
}

/// Per-field counters, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetrics {
    pub key: String,
    /// Output location, `parent.prop` for grouped fields.
    pub output: String,
    pub errors: u64,
    /// Records whose parsed value is null or undefined.
    pub null_values: u64,
}

/// Wall-clock timings of an import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub load_ms: u128,
    pub parse_ms: u128,
    pub total_ms: u128,
}

/// Collect metrics for a parse result produced with `schema`.
pub fn collect_import_metrics(result: &SchemaParseResult, schema: &Schema) -> ImportMetrics {
    let records_total = result.data_with_errors.len() as u64;
    let records_clean = result.parsed_data_without_errors.len() as u64;

    let mut errors_by_kind = BTreeMap::new();
    let mut errors_by_key: BTreeMap<&str, u64> = BTreeMap::new();
    for entry in &result.errors {
        *errors_by_kind
            .entry(entry.kind.as_str().to_string())
            .or_insert(0) += 1;
        *errors_by_key.entry(entry.key.as_str()).or_insert(0) += 1;
    }

    let fields = schema
        .iter()
        .map(|(key, field)| {
            let prop = field.output_key(key);
            let parent = field.parent.as_deref();
            let null_values = result
                .parsed_data
                .iter()
                .filter(|record| is_null_at(record, parent, prop))
                .count() as u64;

            FieldMetrics {
                key: key.to_string(),
                output: match parent {
                    Some(parent) => format!("{parent}.{prop}"),
                    None => prop.to_string(),
                },
                errors: errors_by_key.get(key).copied().unwrap_or(0),
                null_values,
            }
        })
        .collect();

    ImportMetrics {
        metrics_version: METRICS_VERSION.to_string(),
        records_total,
        records_clean,
        records_rejected: records_total - records_clean,
        records_with_errors: result.rejected_indices().len() as u64,
        errors_total: result.errors.len() as u64,
        errors_by_kind,
        fields,
        performance: None,
    }
}

fn is_null_at(record: &ParsedRecord, parent: Option<&str>, prop: &str) -> bool {
    let value = match parent {
        Some(parent) => record.nested(parent, prop),
        None => record.field(prop),
    };
    value.is_none_or(|value| value.is_nullish())
}
