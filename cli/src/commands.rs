//! Subcommand bodies. Each returns the process exit code; hard failures
//! bubble up as `anyhow` errors.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Datelike;

use resonance_config::{OPENAI_KEY_ENV_VAR, ResonanceConfig, config_path};
use resonance_core::{
    format_api_error, lint_commit_message, load_profile, reachable_candidate, render_briefing,
    validate,
};
use resonance_ingest::{Digest, FolderOutcome, extract_images, select_pdfs, write_image_log};
use resonance_providers::links::{LinkProber, LinkStatus};
use resonance_providers::openai::OpenAiClient;
use resonance_providers::retry::RetryConfig;
use resonance_providers::{ApiConfig, ModelName};
use resonance_utils::atomic_write;

use crate::{DigestArgs, ImagesArgs};

const LINK_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn digest(config: &ResonanceConfig, args: DigestArgs) -> Result<ExitCode> {
    let openai = config.openai_settings()?;
    let mut settings = config.digest_settings();
    if let Some(dir) = args.source_dir {
        settings.source_dir = dir;
    }
    if let Some(output) = args.output {
        settings.output = output;
    }
    if let Some(ms) = args.interval_ms {
        settings.request_interval = Duration::from_millis(ms);
    }
    let folders = if args.folders.is_empty() {
        settings.folders.clone()
    } else {
        args.folders
    };

    let model = match args.model.as_deref() {
        Some(raw) => ModelName::parse(raw).context("--model must not be empty")?,
        None => openai.model,
    };

    let Some(key) = config.resolve_openai_key() else {
        let config_hint = config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "the config file".to_string());
        bail!("no OpenAI API key: set {OPENAI_KEY_ENV_VAR} or [api_keys].openai in {config_hint}");
    };

    let api = ApiConfig::new(key, model)
        .with_base_url(openai.base_url)
        .with_max_tokens(openai.max_tokens)
        .with_temperature(openai.temperature)
        .with_timeout(openai.timeout)
        .with_retry(RetryConfig::default().with_max_retries(openai.max_retries));
    let client = OpenAiClient::new(api).context("failed to build OpenAI client")?;

    let report = Digest::new(&client, &settings)
        .run(&folders)
        .await
        .context("digest failed")?;

    for folder in &report.folders {
        match folder.outcome {
            FolderOutcome::Missing => println!("{}: not found", folder.name),
            FolderOutcome::Empty => println!("{}: no supported files", folder.name),
            FolderOutcome::Processed(counts) => println!(
                "{}: {} summarized, {} skipped, {} failed",
                folder.name, counts.summarized, counts.skipped, counts.failed
            ),
        }
    }
    let totals = report.totals();
    println!(
        "total: {} files ({} summarized, {} skipped, {} failed)",
        totals.total(),
        totals.summarized,
        totals.skipped,
        totals.failed
    );
    println!("output: {}", report.output.display());

    if let Some(err) = &report.first_error
        && totals.summarized == 0
    {
        eprintln!("{}", format_api_error(client.config().model().as_str(), &err.0));
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn images(config: &ResonanceConfig, args: ImagesArgs) -> Result<ExitCode> {
    let mut settings = config.image_settings();
    if let Some(dir) = args.pdf_dir {
        settings.pdf_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        settings.output_dir = dir;
    }
    if let Some(px) = args.min_dimension {
        settings.min_dimension = px;
    }

    let pdfs = select_pdfs(&settings.pdf_dir, &args.pdfs)?;
    if pdfs.is_empty() {
        println!("no PDFs in {}", settings.pdf_dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("failed to create {}", settings.output_dir.display()))?;

    let mut extracted = Vec::new();
    for pdf in &pdfs {
        let images = extract_images(pdf, &settings.output_dir, settings.min_dimension);
        println!(
            "{}: {} images",
            pdf.file_name().unwrap_or_default().to_string_lossy(),
            images.len()
        );
        extracted.extend(images);
    }

    println!("total: {} images from {} PDFs", extracted.len(), pdfs.len());
    match write_image_log(&settings.output_dir, &extracted)? {
        Some(log) => println!("log: {}", log.display()),
        None => println!("no images extracted"),
    }
    Ok(ExitCode::SUCCESS)
}

pub fn commit_lint(file: Option<&Path>) -> Result<ExitCode> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read commit message from stdin")?;
            buf
        }
    };

    match lint_commit_message(&raw) {
        Ok(message) => {
            tracing::debug!(kind = message.kind.as_str(), "Commit message accepted");
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("{error}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn profile_path(config: &ResonanceConfig, explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| config.profile_settings().path)
}

pub async fn profile_check(
    config: &ResonanceConfig,
    profile: Option<PathBuf>,
    online: bool,
) -> Result<ExitCode> {
    let path = profile_path(config, profile);
    let profile = load_profile(&path)?;

    let issues = validate(&profile, chrono::Local::now().year());
    for issue in &issues {
        println!("{issue}");
    }
    let mut errors = issues.iter().filter(|issue| issue.is_error()).count();
    let warnings = issues.len() - errors;

    if online {
        let prober = LinkProber::new(LINK_PROBE_TIMEOUT)?;
        for org in &profile.organizations {
            let Some(url) = reachable_candidate(org) else {
                continue;
            };
            let status = prober.probe(url).await;
            match status {
                LinkStatus::Reachable(_) => println!("[ok] {}: {url} {status}", org.id),
                LinkStatus::Broken(_) | LinkStatus::Unreachable(_) => {
                    errors += 1;
                    println!("[error] {}: {url} {status}", org.id);
                }
            }
        }
    }

    println!("{errors} errors, {warnings} warnings");
    Ok(if errors == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn profile_render(
    config: &ResonanceConfig,
    profile: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let path = profile_path(config, profile);
    let briefing = render_briefing(&load_profile(&path)?);

    match output {
        Some(out) => {
            atomic_write(&out, briefing.as_bytes())
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), "Briefing written");
        }
        None => print!("{briefing}"),
    }
    Ok(ExitCode::SUCCESS)
}
