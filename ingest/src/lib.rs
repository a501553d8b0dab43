//! Source material ingestion.
//!
//! - [`extract`] - plain text from PDF, DOCX and TXT files
//! - [`prompt`] - the structuring prompt sent per document
//! - [`digest`] - folder-by-folder LLM digest into one Markdown report
//! - [`images`] - picture extraction from journal PDFs

pub mod digest;
pub mod extract;
pub mod images;
pub mod prompt;

pub use digest::{
    Digest, DigestError, DigestReport, FolderCounts, FolderOutcome, FolderReport, SummarizeError,
    Summarizer, collect_sources,
};
pub use extract::{Extraction, SkipReason, SourceKind, extract_text};
pub use images::{
    ExtractedImage, IMAGE_LOG_FILE, ImageError, SourceLabel, extract_images, parse_source_name,
    render_image_log, select_pdfs, write_image_log,
};
pub use prompt::render_prompt;
