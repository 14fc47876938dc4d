mod plot;
mod report;
mod score;

use clap::{error::ErrorKind, Parser, Subcommand, ValueEnum};
use crossterm::tty::IsTty;
use serde::Serialize;
use serde_json::{json, Value};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracksym_compare::{
    compute_inputs_hash, config_hash, resolve_config, AuditError, AuditTrace, CompareConfig,
    ConfigError, ConfigSource, HashesTrace, InputTrace, PairError, ResolvedConfig, FALLBACK_ENV,
};
use tracksym_core::FallbackMethod;
use tracksym_ingest::{read_tracks, IngestError, IngestReport};

const UNAVAILABLE: &str = "UNAVAILABLE";

#[derive(Parser, Debug)]
#[command(name = "tracksym", version, about = "Trajectory symmetry scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short = 'j', global = true)]
    json: bool,

    /// Debug logging on stderr (RUST_LOG takes precedence).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// JSON file with scenario and fallback settings.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every configured pair of tracks in FILE.
    Score {
        file: PathBuf,
        #[arg(long, value_enum)]
        fallback: Option<FallbackArg>,
        /// Report failed pairs and keep scoring the rest.
        #[arg(long)]
        keep_going: bool,
        /// Show the tracks in the terminal after scoring.
        #[arg(long)]
        plot: bool,
    },
    /// Draw every track in FILE in the terminal.
    Plot { file: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FallbackArg {
    Hausdorff,
    NearestNeighbor,
}

impl From<FallbackArg> for FallbackMethod {
    fn from(value: FallbackArg) -> Self {
        match value {
            FallbackArg::Hausdorff => FallbackMethod::Hausdorff,
            FallbackArg::NearestNeighbor => FallbackMethod::NearestNeighborMeanDifference,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum AppErrorKind {
    Usage,
    Input,
    Config,
    Compute,
    Plot,
}

#[derive(Clone, Debug)]
struct AppError {
    kind: AppErrorKind,
    code: &'static str,
    message: String,
    details: Box<Value>,
    data: Option<Box<Value>>,
    audit: Option<Box<AuditTrace>>,
}

impl AppError {
    fn new(kind: AppErrorKind, code: &'static str, message: String) -> Self {
        Self {
            kind,
            code,
            message,
            details: Box::new(Value::Null),
            data: None,
            audit: None,
        }
    }

    fn usage(message: String) -> Self {
        Self::new(AppErrorKind::Usage, "CLI_USAGE", message)
    }

    fn input_read_failed(message: String) -> Self {
        Self::new(AppErrorKind::Input, "INPUT_READ_FAILED", message)
    }

    fn input_invalid(message: String) -> Self {
        Self::new(AppErrorKind::Input, "INPUT_INVALID", message)
    }

    fn non_finite_input(message: String) -> Self {
        Self::new(AppErrorKind::Input, "NON_FINITE_INPUT", message)
    }

    fn config_invalid(message: String) -> Self {
        Self::new(AppErrorKind::Config, "CONFIG_INVALID", message)
    }

    fn pair_failed(code: &'static str, message: String) -> Self {
        Self::new(AppErrorKind::Compute, code, message)
    }

    fn plot_failed(message: String) -> Self {
        Self::new(AppErrorKind::Plot, "PLOT_FAILED", message)
    }

    fn from_pair(err: &PairError) -> Self {
        Self::pair_failed(err.code(), err.to_string())
            .with_details(json!({ "pair": err.pair, "stage": err.stage }))
    }

    fn exit_code(&self) -> i32 {
        match self.kind {
            AppErrorKind::Usage => 1,
            AppErrorKind::Input
            | AppErrorKind::Config
            | AppErrorKind::Compute
            | AppErrorKind::Plot => 2,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Box::new(details);
        self
    }

    fn with_data(mut self, data: Value) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    fn with_audit(mut self, audit: AuditTrace) -> Self {
        self.audit = Some(Box::new(audit));
        self
    }
}

#[derive(Serialize)]
struct JsonEnvelope {
    status: String,
    error: Option<ErrorEnvelope>,
    audit_trace: AuditTrace,
    data: Option<Value>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    code: String,
    message: String,
    details: Value,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let wants_json = args.iter().any(|arg| arg == "--json" || arg == "-j");

    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose);
            let json = cli.json || wants_json;
            match run(cli, json) {
                Ok(envelope) => {
                    if json {
                        print_json(&envelope);
                    }
                    std::process::exit(0);
                }
                Err(err) => {
                    let exit_code = err.exit_code();
                    if json {
                        print_json(&error_envelope(&err));
                    } else {
                        eprintln!("{}", err.message);
                    }
                    std::process::exit(exit_code);
                }
            }
        }
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                std::process::exit(0);
            }
            _ => {
                if wants_json {
                    let usage = AppError::usage(err.to_string());
                    print_json(&error_envelope(&usage));
                } else {
                    let _ = err.print();
                }
                std::process::exit(1);
            }
        },
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_tty())
        .try_init();
}

fn run(cli: Cli, json: bool) -> Result<JsonEnvelope, AppError> {
    match cli.command {
        Commands::Score {
            file,
            fallback,
            keep_going,
            plot,
        } => score::run(score::ScoreCommand {
            file,
            config: cli.config,
            fallback: fallback.map(FallbackMethod::from),
            keep_going,
            plot,
            json_output: json,
        }),
        Commands::Plot { file } => plot_tracks(&file, cli.config.as_deref()),
    }
}

fn plot_tracks(file: &Path, config: Option<&Path>) -> Result<JsonEnvelope, AppError> {
    let session = load_session(config, file, None)?;
    let audit = session.audit_trace();
    plot::show(&session.ingest.tracks)
        .map_err(|err| AppError::plot_failed(err.to_string()).with_audit(audit.clone()))?;
    Ok(JsonEnvelope {
        status: "OK".to_string(),
        error: None,
        audit_trace: audit,
        data: Some(json!({ "tracks": session.ingest.tracks.ids().collect::<Vec<_>>() })),
    })
}

struct Session {
    path: PathBuf,
    resolved: ResolvedConfig,
    ingest: IngestReport,
}

impl Session {
    fn audit_trace(&self) -> AuditTrace {
        audit_trace(Some(&self.resolved), Some((&self.path, &self.ingest)))
    }
}

fn load_session(
    config_path: Option<&Path>,
    file: &Path,
    cli_fallback: Option<FallbackMethod>,
) -> Result<Session, AppError> {
    let env_fallback = env::var(FALLBACK_ENV).ok();
    let resolved = resolve_config(config_path, env_fallback.as_deref(), cli_fallback)
        .map_err(map_config_error)?;
    debug!(
        source = ?resolved.source,
        fallback = resolved.config.fallback.as_str(),
        tracks = ?resolved.config.scenario.track_ids,
        "config resolved"
    );

    let ingest = read_tracks(file, &resolved.config.scenario).map_err(|err| {
        map_ingest_error(err).with_audit(audit_trace(Some(&resolved), None))
    })?;

    Ok(Session {
        path: file.to_path_buf(),
        resolved,
        ingest,
    })
}

fn audit_trace(
    resolved: Option<&ResolvedConfig>,
    input: Option<(&Path, &IngestReport)>,
) -> AuditTrace {
    let default_config = CompareConfig::default();
    let (config, source) = match resolved {
        Some(resolved) => (&resolved.config, resolved.source),
        None => (&default_config, ConfigSource::Default),
    };
    let inputs_hash = input
        .and_then(|(_, report)| compute_inputs_hash(&report.tracks).ok())
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    AuditTrace {
        hashes: HashesTrace {
            config_hash: config_hash(config).unwrap_or_else(|_| UNAVAILABLE.to_string()),
            inputs_hash,
        },
        config_source: source,
        fallback: config.fallback,
        input: input.map(|(path, report)| InputTrace {
            path: path.display().to_string(),
            tracks: report.tracks.ids().collect(),
            rows_read: report.rows_read,
            rows_skipped: report.rows_skipped,
        }),
        error: None,
    }
}

fn error_envelope(err: &AppError) -> JsonEnvelope {
    let mut audit_trace = err
        .audit
        .as_deref()
        .cloned()
        .unwrap_or_else(|| audit_trace(None, None));
    audit_trace.error = Some(AuditError {
        code: err.code.to_string(),
        message: err.message.clone(),
    });
    JsonEnvelope {
        status: "ERROR".to_string(),
        error: Some(ErrorEnvelope {
            code: err.code.to_string(),
            message: err.message.clone(),
            details: (*err.details).clone(),
        }),
        audit_trace,
        data: err.data.as_deref().cloned(),
    }
}

fn print_json(envelope: &JsonEnvelope) {
    match serde_json::to_string(envelope) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize json: {err}"),
    }
}

fn map_config_error(err: ConfigError) -> AppError {
    let details = match &err {
        ConfigError::Read { path, .. } => json!({ "path": path }),
        ConfigError::Parse { path, .. } => json!({ "path": path }),
        ConfigError::Scenario(_) => Value::Null,
        ConfigError::Env { name, .. } => json!({ "variable": name }),
    };
    AppError::config_invalid(err.to_string()).with_details(details)
}

fn map_ingest_error(err: IngestError) -> AppError {
    let message = err.to_string();
    match err {
        IngestError::Io { path, .. } => {
            AppError::input_read_failed(message).with_details(json!({ "path": path }))
        }
        IngestError::Layout(_) => AppError::config_invalid(message),
        IngestError::Csv { line, .. } => {
            AppError::input_invalid(message).with_details(json!({ "line": line }))
        }
        IngestError::ColumnCount { line, found } => AppError::input_invalid(message)
            .with_details(json!({ "line": line, "columns": found })),
        IngestError::InvalidTrackId { line, value } => AppError::input_invalid(message)
            .with_details(json!({ "line": line, "column": "track", "value": value })),
        IngestError::InvalidNumber {
            line,
            column,
            value,
        } => AppError::input_invalid(message)
            .with_details(json!({ "line": line, "column": column, "value": value })),
        IngestError::NonFiniteNumber {
            line,
            column,
            value,
        } => AppError::non_finite_input(message)
            .with_details(json!({ "line": line, "column": column, "value": value })),
        IngestError::Trajectory(_) => AppError::non_finite_input(message),
    }
}
