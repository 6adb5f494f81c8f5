//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use path_drift_harness::core::config::Config;
use path_drift_harness::core::errors::PdhError;
use path_drift_harness::geometry::kind::PathKind;
use path_drift_harness::geometry::primitives::Rect;
use path_drift_harness::harness::catalog;
use path_drift_harness::harness::conformance::{ConformanceHarness, SuiteReport, Verdict};
use path_drift_harness::harness::report;
use path_drift_harness::harness::transform::BindingName;
use path_drift_harness::logger::run_log::RunLog;
use path_drift_harness::model::drift::{self, Hypothesis, is_discriminating};
use path_drift_harness::model::fixture::{Fixture, RawFixture};

/// Path Drift Harness: checks a bounds transform against the accumulating-offset model.
#[derive(Debug, Parser)]
#[command(
    name = "pdh",
    author,
    version,
    about = "Path Drift Harness - coordinate transform conformance checks",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run a binding against a fixture set and classify every fixture.
    Run(RunArgs),
    /// Print the model's predicted read sequence for one fixture.
    Predict(PredictArgs),
    /// List a fixture set and its fingerprint.
    Fixtures(FixturesArgs),
    /// Inspect configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Where fixtures come from; shared by `run` and `fixtures`.
#[derive(Debug, Clone, Args)]
struct FixtureSource {
    /// Fixture file (TOML, or JSON for *.json) instead of the built-in catalog.
    #[arg(long, value_name = "FILE", conflicts_with = "synthesize")]
    fixtures: Option<PathBuf>,
    /// Generate this many seeded random fixtures instead.
    #[arg(long, value_name = "N")]
    synthesize: Option<usize>,
    /// Seed for --synthesize.
    #[arg(long, default_value_t = 0, requires = "synthesize")]
    seed: u64,
    /// Upper bound on read counts for --synthesize.
    #[arg(long, default_value_t = 6, requires = "synthesize")]
    max_reads: u32,
    /// Keep only fixtures whose id matches this regex.
    #[arg(long, value_name = "REGEX")]
    filter: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Binding to test: reference, accumulating, copy-per-read.
    #[arg(long, short = 't', value_name = "NAME")]
    transform: Option<String>,
    #[command(flatten)]
    source: FixtureSource,
    /// Per-component comparison tolerance.
    #[arg(long, value_name = "EPS", allow_negative_numbers = true)]
    tolerance: Option<f64>,
    /// Worker threads.
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,
    /// Make the binding fail on this read of every path.
    #[arg(long, value_name = "K")]
    fail_on_read: Option<u32>,
    /// Print a column header above the table.
    #[arg(long)]
    header: bool,
    /// Skip the JSONL run log for this invocation.
    #[arg(long)]
    no_log: bool,
}

#[derive(Debug, Clone, Args)]
struct PredictArgs {
    /// Path kind: rect, oval, arc, rounded_rect, explicit_elements.
    #[arg(long)]
    kind: String,
    /// View frame in root coordinates as X,Y,W,H.
    #[arg(long, value_name = "X,Y,W,H", allow_hyphen_values = true)]
    view: String,
    /// Path bounds in view-local coordinates as X,Y,W,H.
    #[arg(long, value_name = "X,Y,W,H", allow_hyphen_values = true)]
    bounds: String,
    /// Number of reads.
    #[arg(long, allow_negative_numbers = true)]
    reads: i64,
    /// Print only this hypothesis (default: both).
    #[arg(long, value_name = "correct|buggy")]
    hypothesis: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct FixturesArgs {
    #[command(flatten)]
    source: FixtureSource,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Load and validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input, fixtures, or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// The suite ran but at least one fixture did not match the correct model.
    #[error("regression: {0}")]
    Regression(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
            Self::Regression(_) => 4,
        }
    }
}

impl From<PdhError> for CliError {
    fn from(err: PdhError) -> Self {
        match err {
            PdhError::Io { .. } | PdhError::Runtime { .. } => Self::Runtime(err.to_string()),
            PdhError::Serialization { .. } => Self::Internal(err.to_string()),
            _ => Self::User(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_suite(cli, args),
        Command::Predict(args) => run_predict(cli, args),
        Command::Fixtures(args) => run_fixtures(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Ok(Config::load(cli.config.as_deref())?)
}

fn resolve_fixtures(config: &Config, source: &FixtureSource) -> Result<Vec<Fixture>, CliError> {
    let fixtures = if let Some(count) = source.synthesize {
        catalog::synthesize(source.seed, count, source.max_reads)?
    } else if let Some(path) = source.fixtures.as_ref().or(config.paths.fixtures_file.as_ref()) {
        catalog::load(path)?
    } else {
        catalog::builtin()?
    };

    let fixtures = match &source.filter {
        Some(pattern) => catalog::filter(fixtures, pattern)?,
        None => fixtures,
    };
    if fixtures.is_empty() {
        return Err(CliError::User("no fixtures selected".to_string()));
    }
    Ok(fixtures)
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn run_suite(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let fixtures = resolve_fixtures(&config, &args.source)?;

    let binding = match &args.transform {
        Some(name) => name.parse::<BindingName>()?,
        None => config.harness.default_transform,
    };
    let fail_on_read = args
        .fail_on_read
        .map(|read| {
            NonZeroU32::new(read)
                .ok_or_else(|| CliError::User("--fail-on-read must be >= 1".to_string()))
        })
        .transpose()?;
    let tolerance = args.tolerance.unwrap_or(config.harness.tolerance);
    let jobs = args.jobs.unwrap_or(config.harness.jobs);

    let mut harness = ConformanceHarness::new(tolerance)?;
    if config.log.enabled && !args.no_log {
        harness = harness.with_log(Arc::new(RunLog::open(config.log.jsonl_config())));
    }

    let report = harness.run_suite_parallel(&fixtures, jobs, || binding.build(fail_on_read))?;

    match output_mode(cli) {
        OutputMode::Human => {
            let table = report::render_table(&report, config.harness.table_header || args.header);
            let mut stdout = io::stdout().lock();
            stdout.write_all(table.as_bytes())?;
            stdout.flush()?;
            if cli.verbose {
                print_mismatches(&report);
            }
            if !cli.quiet {
                print_summary(&report);
            }
        }
        OutputMode::Json => {
            println!("{}", report::render_json(&report)?);
        }
    }

    if report.all_correct() {
        Ok(())
    } else {
        Err(CliError::Regression(report::summary_line(&report)))
    }
}

fn print_summary(report: &SuiteReport) {
    let status = if report.all_correct() {
        "PASS".green().bold()
    } else {
        "REGRESSION".red().bold()
    };
    eprintln!("{status} {}", report::summary_line(report));
}

fn print_mismatches(report: &SuiteReport) {
    for run in report.runs.iter().filter(|run| !run.verdict.is_correct()) {
        match &run.verdict {
            Verdict::TransformFailed { read, details } => {
                eprintln!(
                    "  {}: {} on read {read}: {details}",
                    run.fixture_id.bold(),
                    "transform failed".yellow()
                );
            }
            Verdict::Classified { classification } => {
                let deviation = |value: Option<f64>| {
                    value.map_or_else(|| "n/a".to_string(), |d| format!("{d:.3}"))
                };
                eprintln!(
                    "  {}: {} (max deviation correct={} buggy={})",
                    run.fixture_id.bold(),
                    classification.as_str().yellow(),
                    deviation(run.deviation_correct),
                    deviation(run.deviation_buggy)
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// predict
// ---------------------------------------------------------------------------

fn run_predict(cli: &Cli, args: &PredictArgs) -> Result<(), CliError> {
    let view: Rect = args.view.parse()?;
    let bounds: Rect = args.bounds.parse()?;
    let fixture = Fixture::try_from(RawFixture {
        id: "predict".to_string(),
        kind: args.kind.clone(),
        view_frame: view.to_array(),
        path_bounds: bounds.to_array(),
        reads: args.reads,
    })?;
    let hypotheses: Vec<Hypothesis> = match &args.hypothesis {
        Some(raw) => vec![raw.parse::<Hypothesis>()?],
        None => Hypothesis::ALL.to_vec(),
    };

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            if !cli.quiet {
                writeln!(stdout, "read\thypothesis\tx\ty\twidth\theight")?;
            }
            for hypothesis in &hypotheses {
                for (index, rect) in drift::predict(&fixture, *hypothesis).iter().enumerate() {
                    writeln!(
                        stdout,
                        "{}\t{hypothesis}\t{}\t{}\t{}\t{}",
                        index + 1,
                        rect.origin_x,
                        rect.origin_y,
                        rect.width,
                        rect.height
                    )?;
                }
            }
        }
        OutputMode::Json => {
            let mut sequences = serde_json::Map::new();
            for hypothesis in &hypotheses {
                sequences.insert(
                    hypothesis.as_str().to_string(),
                    serde_json::to_value(drift::predict(&fixture, *hypothesis))?,
                );
            }
            let payload = json!({
                "command": "predict",
                "path_kind": fixture.path_kind(),
                "read_count": fixture.read_count(),
                "discriminating": is_discriminating(&fixture),
                "predictions": Value::Object(sequences),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// fixtures
// ---------------------------------------------------------------------------

fn run_fixtures(cli: &Cli, args: &FixturesArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let fixtures = resolve_fixtures(&config, &args.source)?;
    let fingerprint = catalog::fingerprint(&fixtures)?;

    match output_mode(cli) {
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            for fixture in &fixtures {
                writeln!(
                    stdout,
                    "{}\t{}\t{}\t{}\t{}{}",
                    fixture.id(),
                    fixture.path_kind(),
                    fixture.read_count(),
                    fixture.view_frame(),
                    fixture.path_local_bounds(),
                    if is_discriminating(fixture) { "\tdiscriminating" } else { "" }
                )?;
            }
            if !cli.quiet {
                eprintln!("{} fixtures fingerprint={fingerprint}", fixtures.len());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "fixtures",
                "count": fixtures.len(),
                "fingerprint": fingerprint,
                "drift_prone_kinds": PathKind::ALL
                    .iter()
                    .filter(|kind| kind.is_drift_prone())
                    .map(|kind| kind.as_str())
                    .collect::<Vec<_>>(),
                "fixtures": fixtures,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => {
            let config = load_config(cli)?;
            let hash = config.stable_hash()?;

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("Configuration is valid.");
                    println!("  Source: {}", config.paths.config_file.display());
                    println!("  Hash: {hash}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config validate",
                        "valid": true,
                        "source": config.paths.config_file.to_string_lossy(),
                        "hash": hash,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// output helpers
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("PDH_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

/// `--json` wins, then `PDH_OUTPUT_FORMAT`; `auto` and unknown values fall back to
/// the tabular human format so piped reports keep their line contract.
fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}
