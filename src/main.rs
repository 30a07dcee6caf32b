//! scanwatch CLI

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use scanwatch::config;
use scanwatch::error::Result;
use scanwatch::models::{PipelineConfig, PipelineReport, ScanId};
use scanwatch::pipeline::Pipeline;
use scanwatch::report::{self, OutputFormat};

const EXIT_HALTED: u8 = 1;
const EXIT_FINDINGS: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

/// scanwatch - run a remote vulnerability scan and report high-severity findings
#[derive(Parser)]
#[command(name = "scanwatch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate, launch a scan, wait for it and report high-severity findings
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// URL to scan (overrides SCAN_URL)
        #[arg(short, long)]
        target: Option<String>,

        /// Delay before each status query in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Maximum number of status queries (0 = unbounded)
        #[arg(long)]
        max_poll_attempts: Option<u32>,

        /// Give up waiting after this many seconds
        #[arg(long)]
        poll_timeout: Option<u64>,

        /// Output format (json, table or report)
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Exit with code 2 if any high-severity finding is reported
        #[arg(long)]
        fail_on_findings: bool,
    },

    /// Read the status of an existing scan once
    Status {
        #[command(flatten)]
        common: CommonArgs,

        /// Identifier of the scan
        #[arg(long)]
        scan_id: String,
    },

    /// Fetch and filter the results of an already finished scan
    Results {
        #[command(flatten)]
        common: CommonArgs,

        /// Identifier of the scan
        #[arg(long)]
        scan_id: String,

        /// Output format (json, table or report)
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scanning service base URL (overrides API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Username (overrides USERNAME); the password is read from PASSWORD
    #[arg(short, long)]
    username: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "scanwatch=debug" } else { "scanwatch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the layered configuration, CLI flags last
fn build_config(
    common: &CommonArgs,
    target: Option<String>,
    poll_interval_ms: Option<u64>,
    max_poll_attempts: Option<u32>,
    poll_timeout: Option<u64>,
) -> Result<PipelineConfig> {
    let mut pipeline_config = if let Some(ref path) = common.config {
        config::load_config(path)?
    } else {
        let default_path = Path::new("config/scanwatch.toml");
        if default_path.exists() {
            config::load_config(default_path)?
        } else {
            PipelineConfig::default()
        }
    };

    config::apply_process_env(&mut pipeline_config);
    config::merge_cli_args(
        &mut pipeline_config,
        common.api_url.clone(),
        target,
        common.username.clone(),
        common.timeout,
        poll_interval_ms,
        max_poll_attempts,
        poll_timeout,
    );
    Ok(pipeline_config)
}

fn print_report(pipeline_report: &PipelineReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", report::json::render_findings(&pipeline_report.findings)?)
        }
        OutputFormat::Table => println!("{}", report::table::render(pipeline_report)),
        OutputFormat::Report => println!("{}", report::json::render_report(pipeline_report)?),
    }
    Ok(())
}

async fn execute(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Run {
            common,
            target,
            poll_interval_ms,
            max_poll_attempts,
            poll_timeout,
            format,
            fail_on_findings,
        } => {
            let pipeline_config = build_config(
                &common,
                target,
                poll_interval_ms,
                max_poll_attempts,
                poll_timeout,
            )?;
            config::validate(&pipeline_config)?;

            let pipeline = Pipeline::new(pipeline_config)?;
            let report = pipeline.run().await?;
            print_report(&report, format)?;

            if fail_on_findings && !report.findings.is_empty() {
                eprintln!(
                    "\n  {} {} high-severity findings detected.",
                    "FAIL:".red().bold(),
                    report.findings.len()
                );
                return Ok(ExitCode::from(EXIT_FINDINGS));
            }
        }

        Commands::Status { common, scan_id } => {
            let pipeline_config = build_config(&common, None, None, None, None)?;
            config::validate_connection(&pipeline_config)?;

            let pipeline = Pipeline::new(pipeline_config)?;
            let status = pipeline.status(&ScanId::new(scan_id.clone())).await?;
            println!("{} {}", scan_id.bold(), status.to_string().cyan());

            if status.is_failure() {
                return Ok(ExitCode::from(EXIT_HALTED));
            }
        }

        Commands::Results {
            common,
            scan_id,
            format,
        } => {
            let pipeline_config = build_config(&common, None, None, None, None)?;
            config::validate_connection(&pipeline_config)?;

            let pipeline = Pipeline::new(pipeline_config)?;
            let report = pipeline.results(&ScanId::new(scan_id)).await?;
            print_report(&report, format)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Run { common, .. }
        | Commands::Status { common, .. }
        | Commands::Results { common, .. } => common.verbose,
    };
    init_tracing(verbose);

    tokio::select! {
        result = execute(cli.command) => match result {
            Ok(code) => code,
            Err(e) => {
                // stage failures were already logged where they happened
                if !e.is_pipeline_halt() {
                    error!("{e}");
                }
                ExitCode::from(EXIT_HALTED)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            error!("Interrupted, no report produced");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}
