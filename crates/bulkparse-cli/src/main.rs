mod input;
mod registry;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use bulkparse_core::schema_parser;
use bulkparse_definition::{
    DefinitionError, ParserRegistry, ValidationReport, compile_definition,
    definition_json_schema_value, load_definition_json, validate_definition,
};
use bulkparse_eval::{PerformanceMetrics, collect_import_metrics, render_report};
use clap::{Args, Parser, Subcommand};
use input::{InputError, load_records};
use registry::{
    RunContext, init_run_logging, start_run, write_clean, write_metrics, write_report,
    write_result,
};
use settings::{SETTINGS_FILE, SettingsError, init_settings, load_settings};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid definition:\n{0}")]
    InvalidDefinition(String),
    #[error("{0} record(s) rejected in strict mode")]
    Rejected(u64),
}

#[derive(Parser, Debug)]
#[command(name = "bulkparse", version, about = "Schema-driven bulk record validation")]
struct Cli {
    /// Settings file.
    #[arg(long, global = true, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and parse a record file against a definition.
    Validate(ValidateArgs),
    /// Print the JSON Schema of definition files.
    DefinitionSchema,
    /// List the registered parsers.
    Parsers,
    /// Manage bulkparse.toml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write default settings.
    Init {
        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Definition file (JSON).
    #[arg(long)]
    schema: PathBuf,
    /// Record file (.csv or .json).
    #[arg(long)]
    input: PathBuf,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Optional output path for the clean records.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Fail when any record is rejected.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Error examples listed in the report.
    #[arg(long)]
    max_examples: Option<usize>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => run_validate(&cli.config, args),
        Command::DefinitionSchema => {
            let schema = definition_json_schema_value()?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Command::Parsers => {
            for parser in ParserRegistry::new().iter() {
                println!("{:<22}{}", parser.id(), parser.description());
            }
            Ok(())
        }
        Command::Config {
            command: ConfigCommand::Init { force },
        } => {
            init_settings(&cli.config, force)?;
            println!("settings_path={}", cli.config.display());
            Ok(())
        }
    }
}

fn run_validate(config_path: &Path, args: ValidateArgs) -> Result<(), CliError> {
    let ValidateArgs {
        schema,
        input,
        run_dir,
        out,
        strict,
        max_examples,
    } = args;

    let settings = load_settings(config_path)?;
    let strict = strict || settings.strict;
    let max_examples = max_examples.unwrap_or(settings.max_examples);
    let run_dir = run_dir.unwrap_or(settings.run_dir.clone());

    let registry = ParserRegistry::new();
    let definition_json = load_definition_json(&schema)?;
    let definition_schema = definition_json_schema_value()?;
    let validated = validate_definition(&definition_json, &definition_schema, &registry)
        .map_err(|report| CliError::InvalidDefinition(format_issues(&report)))?;

    let timer = Instant::now();
    let (input_format, records) = load_records(&input)?;
    let load_ms = timer.elapsed().as_millis();

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        definition_name: validated.definition.name.clone(),
        definition_version: validated.definition.definition_version.clone(),
        definition_path: schema,
        input_path: input,
        input_format: input_format.as_str().to_string(),
        strict,
        max_examples,
        write_clean: settings.write_clean,
        run_dir,
        out,
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path, &settings.log_level)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        definition = %run_ctx.definition_name,
        records = records.len()
    );
    for warning in &validated.warnings {
        tracing::warn!(
            event = "definition_warning",
            code = %warning.code,
            path = %warning.path,
            message = %warning.message
        );
    }

    let compiled = compile_definition(&validated.definition, &registry)?;
    tracing::info!(event = "definition_compiled", fields = compiled.len());

    let parse_timer = Instant::now();
    let result = schema_parser(&records, &compiled);
    let parse_ms = parse_timer.elapsed().as_millis();
    tracing::info!(
        event = "records_parsed",
        errors = result.errors.len(),
        clean = result.parsed_data_without_errors.len()
    );

    let mut metrics = collect_import_metrics(&result, &compiled);
    metrics.performance = Some(PerformanceMetrics {
        load_ms,
        parse_ms,
        total_ms: timer.elapsed().as_millis(),
    });
    let report = render_report(&metrics, &result.errors, max_examples);

    write_result(&run_paths, &result)?;
    tracing::info!(event = "result_written", path = %run_paths.result_path.display());

    write_clean(
        &run_paths,
        &result.parsed_data_without_errors,
        run_ctx.write_clean,
        run_ctx.out.as_deref(),
    )?;
    tracing::info!(event = "clean_written", records = result.parsed_data_without_errors.len());

    write_metrics(&run_paths, &metrics)?;
    tracing::info!(event = "metrics_written", path = %run_paths.metrics_path.display());

    write_report(&run_paths, &report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    println!("run_path={}", run_paths.root.display());
    println!(
        "records={} clean={} rejected={} errors={}",
        metrics.records_total, metrics.records_clean, metrics.records_rejected, metrics.errors_total
    );

    if strict && metrics.records_rejected > 0 {
        tracing::info!(event = "run_finished", status = "rejected");
        return Err(CliError::Rejected(metrics.records_rejected));
    }

    tracing::info!(
        event = "run_finished",
        status = "success",
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn format_issues(report: &ValidationReport) -> String {
    report
        .errors
        .iter()
        .map(|issue| {
            let hint = issue
                .hint
                .as_ref()
                .map(|hint| format!(" (hint: {hint})"))
                .unwrap_or_default();
            format!("- [{}] {}: {}{}", issue.code, issue.path, issue.message, hint)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
