//! Resonance CLI.
//!
//! ```text
//! resonance digest [FOLDER...]        summarize source folders via OpenAI
//! resonance images [PDF...]           harvest pictures from journal PDFs
//! resonance commit-lint [FILE]        check a commit message (commit-msg hook)
//! resonance profile check|render      validate or render the organization profile
//! ```
//!
//! Logs go to stderr; stdout carries command output only.

mod commands;
mod crash_hardening;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use resonance_config::ResonanceConfig;

#[derive(Parser)]
#[command(name = "resonance", version)]
#[command(about = "Prepare outreach material: digests, journal images, profile briefings")]
struct Cli {
    /// Config file (default: $RESONANCE_CONFIG or ~/.resonance/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize source folders into one Markdown digest
    Digest(DigestArgs),
    /// Extract images from journal PDFs
    Images(ImagesArgs),
    /// Check a commit message against the `<type>: <summary>` convention
    CommitLint {
        /// Message file (as passed to a commit-msg hook); stdin when omitted
        file: Option<PathBuf>,
    },
    /// Organization profile tools
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args)]
struct DigestArgs {
    /// Folder names under the source directory, in processing order
    folders: Vec<String>,
    #[arg(long, value_name = "DIR")]
    source_dir: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
    /// Pause after each successful request, in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,
}

#[derive(Args)]
struct ImagesArgs {
    /// PDF file names inside the PDF directory; all PDFs when omitted
    pdfs: Vec<String>,
    #[arg(long, value_name = "DIR")]
    pdf_dir: Option<PathBuf>,
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Skip images narrower or shorter than this many pixels
    #[arg(long, value_name = "PX")]
    min_dimension: Option<u32>,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Validate the profile; exits non-zero on errors
    Check {
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
        /// Also probe every organization URL
        #[arg(long)]
        online: bool,
    },
    /// Render the profile as a Markdown briefing
    Render {
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
        /// Write here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<ResonanceConfig> {
    match explicit {
        Some(path) => ResonanceConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ResonanceConfig::load()
            .context("failed to load config")?
            .unwrap_or_default()),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = crash_hardening::apply() {
        tracing::warn!("{e:#}");
    }

    resonance_config::load_dotenv();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Digest(args) => commands::digest(&config, args).await,
        Command::Images(args) => commands::images(&config, args),
        Command::CommitLint { file } => commands::commit_lint(file.as_deref()),
        Command::Profile(ProfileCommand::Check { profile, online }) => {
            commands::profile_check(&config, profile, online).await
        }
        Command::Profile(ProfileCommand::Render { profile, output }) => {
            commands::profile_render(&config, profile, output)
        }
    }
}
