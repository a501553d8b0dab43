use std::path::Path;

use lopdf::Document;

use super::ExtractError;

/// Text of every page that yields any, joined with newlines.
pub(super) fn extract(path: &Path) -> Result<String, ExtractError> {
    let doc = Document::load(path)?;
    let mut parts = Vec::new();

    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) if !text.is_empty() => parts.push(text),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), page = page_number, "Page text unreadable: {e}");
            }
        }
    }

    Ok(parts.join("\n"))
}
