//! Plain-text extraction from source documents.
//!
//! Extraction never fails outright: anything that cannot produce text comes
//! back as [`Extraction::Skipped`] with a reason suitable for the digest.

mod docx;
mod pdf;

use std::fmt;
use std::path::Path;

use resonance_types::truncate_chars;
use thiserror::Error;

/// Appended when PDF or DOCX text is cut at the character limit.
pub const TRUNCATION_SUFFIX: &str = "\n...[以下省略]...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Docx,
    Doc,
    Txt,
    Unsupported(String),
}

impl SourceKind {
    /// Classify by extension, ignoring case.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "doc" => Self::Doc,
            "txt" => Self::Txt,
            _ => Self::Unsupported(format!(".{ext}")),
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// PDF without a text layer, usually a scan.
    NoTextLayer,
    EmptyDocument,
    LegacyDoc,
    Unsupported(String),
    ReadFailed { format: &'static str, detail: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTextLayer => f.write_str("テキスト抽出不可 - スキャンPDFの可能性"),
            Self::EmptyDocument => f.write_str("テキストが空です"),
            Self::LegacyDoc => f.write_str(".doc形式は非対応 - .docxに変換が必要"),
            Self::Unsupported(ext) => write!(f, "非対応ファイル形式: {ext}"),
            Self::ReadFailed { format, detail } => write!(f, "{format}読み取りエラー: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Skipped(SkipReason),
}

#[derive(Debug, Error)]
pub(crate) enum ExtractError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}

fn read_failed(format: &'static str, path: &Path, err: &ExtractError) -> Extraction {
    tracing::warn!(path = %path.display(), error = %err, "Failed to read {format}");
    Extraction::Skipped(SkipReason::ReadFailed {
        format,
        detail: err.to_string(),
    })
}

fn capped(text: String, max_chars: usize, empty: SkipReason) -> Extraction {
    if text.trim().is_empty() {
        Extraction::Skipped(empty)
    } else {
        Extraction::Text(truncate_chars(&text, max_chars, TRUNCATION_SUFFIX))
    }
}

/// Extract up to `max_chars` characters of text from `path`.
#[must_use]
pub fn extract_text(path: &Path, max_chars: usize) -> Extraction {
    match SourceKind::from_path(path) {
        SourceKind::Pdf => match pdf::extract(path) {
            Ok(text) => capped(text, max_chars, SkipReason::NoTextLayer),
            Err(e) => read_failed("PDF", path, &e),
        },
        SourceKind::Docx => match docx::extract(path) {
            Ok(text) => capped(text, max_chars, SkipReason::EmptyDocument),
            Err(e) => read_failed("DOCX", path, &e),
        },
        SourceKind::Doc => Extraction::Skipped(SkipReason::LegacyDoc),
        SourceKind::Txt => match std::fs::read_to_string(path) {
            Ok(text) => Extraction::Text(truncate_chars(&text, max_chars, "")),
            Err(e) => read_failed("テキスト", path, &ExtractError::from(e)),
        },
        SourceKind::Unsupported(ext) => Extraction::Skipped(SkipReason::Unsupported(ext)),
    }
}
