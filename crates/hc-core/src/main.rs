//! Host Collector - archive redaction and obfuscation
//!
//! The main entry point for host-collector, handling:
//! - In-place cleaning of a collected archive
//! - Cleaning a single stream (stdin to stdout)
//! - Configuration checks

use clap::{Args, Parser, Subcommand};
use hc_core::clean::{
    run_clean, run_clean_text, CleanError, CleanRequest, ConfigRequest, TextRequest,
};
use hc_core::exit_codes::ExitCode;
use hc_core::logging::{init_logging, level_from_verbosity, LogConfig, LogFormat};
use hc_redact::{Category, CategorySet};
use std::path::PathBuf;

/// Host Collector - redact and obfuscate collected host data
#[derive(Parser)]
#[command(name = "host-collector")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true, env = "HC_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a collected archive directory in place
    Clean(CleanArgs),

    /// Clean stdin to stdout with the same rules
    CleanText(CleanTextArgs),

    /// Load and validate configuration, print its provenance
    CheckConfig(ConfigArgs),
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Collector settings file (YAML or JSON)
    #[arg(long, value_name = "PATH")]
    collector_config: Option<PathBuf>,

    /// Redaction rules file (YAML or JSON)
    #[arg(long, value_name = "PATH")]
    redaction_config: Option<PathBuf>,

    /// Additional keyword to obfuscate (repeatable)
    #[arg(long = "keyword", value_name = "WORD")]
    keywords: Vec<String>,

    /// Categories to obfuscate, replacing the configured set
    #[arg(long, value_delimiter = ',', value_name = "CATEGORY")]
    obfuscate: Option<Vec<Category>>,

    /// Categories to leave alone for this run
    #[arg(long, value_delimiter = ',', value_name = "CATEGORY")]
    no_obfuscate: Vec<Category>,

    /// Skip line dropping and password masking
    #[arg(long)]
    no_redact: bool,

    /// Host name to obfuscate instead of the resolved one
    #[arg(long)]
    hostname: Option<String>,
}

impl ConfigArgs {
    fn request(&self) -> ConfigRequest {
        ConfigRequest {
            collector_config: self.collector_config.clone(),
            redaction_config: self.redaction_config.clone(),
            keywords: self.keywords.clone(),
            obfuscate: self
                .obfuscate
                .as_ref()
                .map(|list| list.iter().copied().collect::<CategorySet>()),
            no_obfuscate: self.no_obfuscate.iter().copied().collect(),
            no_redact: self.no_redact,
            hostname: self.hostname.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Archive directory to clean
    archive: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    /// Directory for the mapping reports
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Facts sidecar path
    #[arg(long, value_name = "PATH")]
    facts_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CleanTextArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Keep column alignment of tabular input
    #[arg(long)]
    preserve_width: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        level_from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let exit_code = match cli.command {
        Commands::Clean(args) => run_clean_command(&args),
        Commands::CleanText(args) => run_clean_text_command(&args),
        Commands::CheckConfig(args) => run_check_config(&args),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn fail(err: &CleanError) -> ExitCode {
    let code = err.exit_code();
    tracing::error!(code = %code, "{}", err);
    eprintln!("host-collector: {}", err);
    code
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("host-collector: cannot render output: {}", e),
    }
}

fn run_clean_command(args: &CleanArgs) -> ExitCode {
    let request = CleanRequest {
        archive: args.archive.clone(),
        config: args.config.request(),
        report_dir: args.report_dir.clone(),
        facts_path: args.facts_path.clone(),
    };
    match run_clean(&request) {
        Ok(outcome) => {
            print_json(&serde_json::to_value(&outcome).unwrap_or_default());
            outcome.exit_code()
        }
        Err(err) => fail(&err),
    }
}

fn run_clean_text_command(args: &CleanTextArgs) -> ExitCode {
    let request = TextRequest {
        config: args.config.request(),
        preserve_width: args.preserve_width,
    };
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    match run_clean_text(&request, stdin.lock(), stdout.lock()) {
        Ok(stats) => {
            tracing::debug!(
                lines = stats.lines_seen,
                dropped = stats.lines_dropped,
                substitutions = stats.total_substitutions(),
                "stream cleaned"
            );
            ExitCode::Clean
        }
        Err(err) => fail(&err),
    }
}

fn run_check_config(args: &ConfigArgs) -> ExitCode {
    match args.request().load() {
        Ok(loaded) => {
            print_json(&serde_json::json!({
                "valid": true,
                "snapshot": loaded.snapshot().to_value(),
            }));
            ExitCode::Clean
        }
        Err(err) => {
            let code = match err {
                CleanError::Config(ref e) => e.code(),
                _ => 0,
            };
            print_json(&serde_json::json!({
                "valid": false,
                "error": err.to_string(),
                "code": code,
            }));
            fail(&err)
        }
    }
}
