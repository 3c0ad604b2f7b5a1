use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use bulkparse_core::{ParsedRecord, SchemaParseResult};
use bulkparse_eval::ImportMetrics;

use super::{RegistryError, RegistryResult};

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub definition_name: String,
    pub definition_version: String,
    pub definition_path: PathBuf,
    pub input_path: PathBuf,
    pub input_format: String,
    pub strict: bool,
    pub max_examples: usize,
    pub write_clean: bool,
    pub run_dir: PathBuf,
    pub out: Option<PathBuf>,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub definition_name: String,
    pub definition_version: String,
    pub definition_path: String,
    pub input_path: String,
    pub input_format: String,
    pub strict: bool,
    pub max_examples: usize,
    pub write_clean: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub result_path: PathBuf,
    pub clean_path: PathBuf,
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        definition_name: ctx.definition_name.clone(),
        definition_version: ctx.definition_version.clone(),
        definition_path: ctx.definition_path.display().to_string(),
        input_path: ctx.input_path.display().to_string(),
        input_format: ctx.input_format.clone(),
        strict: ctx.strict,
        max_examples: ctx.max_examples,
        write_clean: ctx.write_clean,
        out: ctx.out.as_ref().map(|path| path.display().to_string()),
        git: collect_git_info(),
    };
    write_json(&root.join("config.json"), &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        logs_path,
        result_path: root.join("result.json"),
        clean_path: root.join("clean.json"),
        metrics_path: root.join("metrics.json"),
        report_path: root.join("report.md"),
        root,
    })
}

pub fn write_result(paths: &RunPaths, result: &SchemaParseResult) -> RegistryResult<()> {
    write_json(&paths.result_path, result)
}

/// Write the clean records to the run directory and, when given, to `out_path`.
pub fn write_clean(
    paths: &RunPaths,
    clean: &[ParsedRecord],
    in_run: bool,
    out_path: Option<&Path>,
) -> RegistryResult<()> {
    if in_run {
        write_json(&paths.clean_path, &clean)?;
    }

    if let Some(out_path) = out_path {
        if let Some(parent) = out_path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        write_json(out_path, &clean)?;
    }

    Ok(())
}

pub fn write_metrics(paths: &RunPaths, metrics: &ImportMetrics) -> RegistryResult<()> {
    write_json(&paths.metrics_path, metrics)
}

pub fn write_report(paths: &RunPaths, report: &str) -> RegistryResult<()> {
    std::fs::write(&paths.report_path, report).map_err(RegistryError::from)
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn context(run_dir: PathBuf) -> RunContext {
        RunContext {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            definition_name: "patients".to_string(),
            definition_version: "0.1".to_string(),
            definition_path: PathBuf::from("patients.definition.json"),
            input_path: PathBuf::from("patients.csv"),
            input_format: "csv".to_string(),
            strict: false,
            max_examples: 20,
            write_clean: true,
            run_dir,
            out: None,
        }
    }

    #[test]
    fn start_run_creates_layout_and_config() {
        let run_dir = std::env::temp_dir().join(format!("bulkparse-run-{}", Uuid::new_v4()));
        let ctx = context(run_dir.clone());

        let paths = start_run(&ctx).expect("start run");
        let name = paths
            .root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .expect("run dir name");
        assert!(name.ends_with(&format!("__run_{}", ctx.run_id)));
        assert!(paths.logs_path.exists());

        let config: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(paths.root.join("config.json")).expect("read config"),
        )
        .expect("parse config");
        assert_eq!(config["definition_name"], "patients");
        assert_eq!(config["input_format"], "csv");
        assert!(config.get("out").is_none());

        std::fs::remove_dir_all(&run_dir).expect("cleanup");
    }

    #[test]
    fn clean_records_can_be_copied_to_out() {
        let run_dir = std::env::temp_dir().join(format!("bulkparse-run-{}", Uuid::new_v4()));
        let paths = start_run(&context(run_dir.clone())).expect("start run");
        let out = run_dir.join("exports").join("clean.json");

        write_clean(&paths, &[], false, Some(&out)).expect("write clean");
        assert!(!paths.clean_path.exists());
        assert_eq!(std::fs::read_to_string(&out).expect("read out"), "[]");

        std::fs::remove_dir_all(&run_dir).expect("cleanup");
    }
}
