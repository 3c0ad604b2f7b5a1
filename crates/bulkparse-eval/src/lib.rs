//! Import metrics and markdown reports for schema parse results.

pub mod metrics;
pub mod report;

pub use metrics::{
    FieldMetrics, ImportMetrics, METRICS_VERSION, PerformanceMetrics, collect_import_metrics,
};
pub use report::render_report;
