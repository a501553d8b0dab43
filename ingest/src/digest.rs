//! Batch digest of source folders into one Markdown report.
//!
//! Each supported file is extracted, wrapped in the structuring prompt and
//! sent to a [`Summarizer`]. Failures are written into the report as error
//! blocks so one unreadable file never stops the batch.

use std::future::Future;
use std::path::{Path, PathBuf};

use resonance_config::DigestSettings;
use resonance_core::summarize_api_error;
use resonance_providers::openai::OpenAiClient;
use resonance_utils::{append_file, atomic_write};
use thiserror::Error;

use crate::extract::{Extraction, SkipReason, SourceKind, extract_text};
use crate::prompt::render_prompt;

const REPORT_TITLE: &str = "# 資料まとめ（API処理結果）";
const SECTION_RULE_WIDTH: usize = 60;

/// Raw failure text from the summarizer, e.g. `API error 429 ...: {body}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SummarizeError(pub String);

/// Something that turns a prompt into a summary.
pub trait Summarizer {
    /// Model name recorded in the report header.
    fn model(&self) -> &str;

    fn summarize(&self, prompt: &str) -> impl Future<Output = Result<String, SummarizeError>>;
}

impl Summarizer for OpenAiClient {
    fn model(&self) -> &str {
        self.config().model().as_str()
    }

    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        self.complete(prompt)
            .await
            .map(|completion| completion.content)
            .map_err(|e| SummarizeError(e.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("failed to write digest output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to list source folder {}: {source}", path.display())]
    ListFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderCounts {
    pub summarized: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FolderCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.summarized + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    Missing,
    Empty,
    Processed(FolderCounts),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub name: String,
    pub outcome: FolderOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestReport {
    pub output: PathBuf,
    pub folders: Vec<FolderReport>,
    /// First summarizer failure, unabridged.
    pub first_error: Option<SummarizeError>,
}

impl DigestReport {
    #[must_use]
    pub fn totals(&self) -> FolderCounts {
        self.folders
            .iter()
            .filter_map(|f| match f.outcome {
                FolderOutcome::Processed(counts) => Some(counts),
                _ => None,
            })
            .fold(FolderCounts::default(), |acc, c| FolderCounts {
                summarized: acc.summarized + c.summarized,
                skipped: acc.skipped + c.skipped,
                failed: acc.failed + c.failed,
            })
    }
}

/// Supported files directly inside `folder`, sorted by file name.
pub fn collect_sources(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && SourceKind::from_path(path).is_supported())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn skip_block(file: &str, reason: &SkipReason) -> String {
    format!("\n---\n\n## {file}\n\n**エラー**: [{reason}]\n\n---\n")
}

fn api_error_block(file: &str, err: &SummarizeError) -> String {
    let err = summarize_api_error(&err.0);
    format!("\n---\n\n## {file}\n\n**APIエラー**: {err}\n\n---\n")
}

fn report_header(model: &str) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("{REPORT_TITLE}\n\nOpenAI {model} による自動処理結果\n処理日時: {now}\n\n")
}

fn folder_section(folder: &str, entries: &[String]) -> String {
    let rule = "=".repeat(SECTION_RULE_WIDTH);
    format!("\n\n{rule}\n# {folder}\n{rule}\n\n{}", entries.join("\n"))
}

enum Entry {
    Summary(String),
    Skipped(String),
    Failed(String, SummarizeError),
}

pub struct Digest<'a, S> {
    summarizer: &'a S,
    settings: &'a DigestSettings,
}

impl<'a, S: Summarizer> Digest<'a, S> {
    #[must_use]
    pub fn new(summarizer: &'a S, settings: &'a DigestSettings) -> Self {
        Self {
            summarizer,
            settings,
        }
    }

    fn output_error(&self, source: std::io::Error) -> DigestError {
        DigestError::Output {
            path: self.settings.output.clone(),
            source,
        }
    }

    /// Digest `folders` (names under the source directory) in order.
    ///
    /// The output file is recreated with a fresh header first.
    pub async fn run(&self, folders: &[String]) -> Result<DigestReport, DigestError> {
        let output = &self.settings.output;
        atomic_write(output, report_header(self.summarizer.model()).as_bytes())
            .map_err(|e| self.output_error(e))?;
        tracing::info!(output = %output.display(), model = self.summarizer.model(), "Digest started");

        let mut reports = Vec::with_capacity(folders.len());
        let mut first_error = None;
        for name in folders {
            let outcome = self.run_folder(name, &mut first_error).await?;
            reports.push(FolderReport {
                name: name.clone(),
                outcome,
            });
        }

        Ok(DigestReport {
            output: output.clone(),
            folders: reports,
            first_error,
        })
    }

    async fn run_folder(
        &self,
        name: &str,
        first_error: &mut Option<SummarizeError>,
    ) -> Result<FolderOutcome, DigestError> {
        let folder = self.settings.source_dir.join(name);
        if !folder.is_dir() {
            tracing::info!(folder = %folder.display(), "Skipping folder (not found)");
            return Ok(FolderOutcome::Missing);
        }

        let files = collect_sources(&folder).map_err(|source| DigestError::ListFolder {
            path: folder.clone(),
            source,
        })?;
        tracing::info!(folder = name, files = files.len(), "Processing folder");
        if files.is_empty() {
            tracing::info!(folder = name, "No source files");
            return Ok(FolderOutcome::Empty);
        }

        let mut counts = FolderCounts::default();
        let mut entries = Vec::with_capacity(files.len());
        for (index, path) in files.iter().enumerate() {
            tracing::info!(file = %file_label(path), "[{}/{}] Processing", index + 1, files.len());
            match self.process_file(path).await {
                Entry::Summary(text) => {
                    counts.summarized += 1;
                    entries.push(text);
                    tokio::time::sleep(self.settings.request_interval).await;
                }
                Entry::Skipped(block) => {
                    counts.skipped += 1;
                    entries.push(block);
                }
                Entry::Failed(block, err) => {
                    counts.failed += 1;
                    entries.push(block);
                    if first_error.is_none() {
                        *first_error = Some(err);
                    }
                }
            }
        }

        append_file(&self.settings.output, folder_section(name, &entries).as_bytes())
            .map_err(|e| self.output_error(e))?;
        tracing::info!(
            folder = name,
            summarized = counts.summarized,
            skipped = counts.skipped,
            failed = counts.failed,
            "Folder done"
        );
        Ok(FolderOutcome::Processed(counts))
    }

    async fn process_file(&self, path: &Path) -> Entry {
        let label = file_label(path);
        let max_chars = self.settings.max_chars;
        let owned = path.to_path_buf();
        let extraction = tokio::task::spawn_blocking(move || extract_text(&owned, max_chars))
            .await
            .unwrap_or_else(|e| {
                Extraction::Skipped(SkipReason::ReadFailed {
                    format: "ファイル",
                    detail: e.to_string(),
                })
            });

        let content = match extraction {
            Extraction::Text(content) => content,
            Extraction::Skipped(reason) => {
                tracing::info!(file = %label, %reason, "Skipped");
                return Entry::Skipped(skip_block(&label, &reason));
            }
        };

        match self.summarizer.summarize(&render_prompt(&label, &content)).await {
            Ok(summary) => Entry::Summary(summary),
            Err(e) => {
                tracing::warn!(file = %label, error = %e, "Summarization failed");
                Entry::Failed(api_error_block(&label, &e), e)
            }
        }
    }
}
