mod config;
mod logging;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use renamer_connect::{open_target, read_schema_with_timeout, ReadOptions, SchemaReadError};
use renamer_core::{build_fk_graph_report, redact_connection_string, Error as CoreError};
use renamer_exec::{execute, write_report, ExecuteOptions, ExecutionError, ExecutionReport};
use renamer_plan::{build_plan, generate_names, resolve, PlanConflict};
use thiserror::Error;
use uuid::Uuid;

use config::{apply_overrides, load_config, ConventionArg, Overrides};
use logging::{init_logging, LogFormat};

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("cannot read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("schema read failed: {0}")]
    SchemaRead(#[from] SchemaReadError),
    #[error("plan conflict: {0}")]
    Plan(#[from] PlanConflict),
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
    #[error("report error: {0}")]
    Report(ExecutionError),
    #[error("logging error: {0}")]
    Logging(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::SchemaRead(_) => 2,
            CliError::Plan(_) => 3,
            CliError::Execution(_) => 4,
            _ => 1,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "dm-renamer",
    version,
    about = "Replace table and column names with generic placeholders, keeping relationships intact"
)]
struct Cli {
    /// PostgreSQL or SQLite URL, SQLite file, JSON schema snapshot, or directory of CSV files.
    #[arg(value_name = "TARGET")]
    target: String,
    /// Prefix for generated table names (`table` gives `table_a`).
    #[arg(long = "prefix_table", value_name = "PREFIX")]
    prefix_table: Option<String>,
    /// Prefix for generated column names (`column` gives `column1`).
    #[arg(long = "prefix_column", value_name = "PREFIX")]
    prefix_column: Option<String>,
    /// Print the plan without renaming anything.
    #[arg(long = "dry_run", default_value_t = false)]
    dry_run: bool,
    /// Append `<kind>\t<original>\t<generated>` lines for every rename.
    #[arg(long = "log_file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// TOML file with renamer settings; flags take precedence.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Namespace(s) to read. Defaults to every non-system namespace.
    #[arg(long, value_name = "SCHEMA")]
    schema: Vec<String>,
    /// Table (bare or `schema.table`) that keeps its name.
    #[arg(long = "exclude_table", value_name = "TABLE")]
    exclude_table: Vec<String>,
    /// Naming convention used to infer undeclared foreign keys, in order.
    #[arg(long, value_enum, value_name = "NAME")]
    convention: Vec<ConventionArg>,
    /// Regex with a named `table` capture (and optional `column`) marking a reference.
    #[arg(long = "fk_pattern", value_name = "REGEX")]
    fk_pattern: Vec<String>,
    /// Limit for connecting, reading the schema, and each rename.
    #[arg(long = "timeout_secs", value_name = "SECONDS")]
    timeout_secs: Option<u64>,
    /// Write a JSON execution report.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Diagnostic log format on stderr.
    #[arg(long = "log_format", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_format) {
        eprintln!("error: {err}");
        return ExitCode::from(err.exit_code());
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(event = "run_failed", exit_code = err.exit_code(), error = %err);
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        target,
        prefix_table,
        prefix_column,
        dry_run,
        log_file,
        config,
        schema,
        exclude_table,
        convention,
        fk_pattern,
        timeout_secs,
        report,
        log_format: _,
    } = cli;

    let run_id = Uuid::new_v4().to_string();
    let timer = Instant::now();
    let timeout = timeout_secs.map(Duration::from_secs);
    let redacted = redact_connection_string(&target).redacted;

    tracing::info!(event = "run_started", run_id = %run_id, target = %redacted, dry_run);

    let mut rename_config = apply_overrides(
        load_config(config.as_deref())?,
        Overrides {
            prefix_table,
            prefix_column,
            exclude_tables: exclude_table,
            conventions: convention,
            fk_patterns: fk_pattern,
        },
    )?;

    let mut connector = open_target(&target, timeout.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT)).await?;
    if rename_config.max_identifier_len.is_none() {
        rename_config.max_identifier_len = connector.max_identifier_len();
    }

    let read_options = ReadOptions {
        include_system_schemas: false,
        schemas: if schema.is_empty() { None } else { Some(schema) },
    };
    let db_schema = read_schema_with_timeout(connector.as_mut(), &read_options, timeout).await?;
    tracing::info!(
        event = "schema_read",
        engine = %db_schema.engine,
        tables = db_schema.tables().count(),
        columns = db_schema.column_count()
    );

    let fk_graph = build_fk_graph_report(&db_schema);
    if let Some(cycle) = &fk_graph.cycle {
        tracing::info!(
            event = "fk_cycle",
            tables = ?cycle,
            "declared foreign keys form a cycle; cycle members are named alphabetically"
        );
    }

    let graph = resolve(&db_schema, &rename_config)?;
    let mapping = generate_names(&db_schema, &graph, &rename_config)?;
    let plan = build_plan(&db_schema, &graph, &mapping)?;
    tracing::info!(
        event = "plan_ready",
        relationships = graph.relationships().len(),
        ambiguities = graph.ambiguities().len(),
        tables = plan.table_ops(),
        columns = plan.column_ops()
    );

    let options = ExecuteOptions {
        run_id: run_id.clone(),
        dry_run,
        log_file,
        op_timeout: timeout,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = execute(connector.as_mut(), &plan, &options, &mut out).await;
    out.flush().ok();

    let written = match &outcome {
        Ok(result) => Some(result),
        Err(err) => err.report(),
    };
    if let (Some(path), Some(result)) = (report.as_deref(), written) {
        write_report(path, result).map_err(CliError::Report)?;
        tracing::info!(event = "report_written", path = %path.display());
    }

    let result: ExecutionReport = outcome?;
    tracing::info!(
        event = "run_finished",
        status = "success",
        run_id = %run_id,
        applied = result.applied,
        total = result.total,
        duration_ms = timer.elapsed().as_millis() as u64
    );

    Ok(())
}
