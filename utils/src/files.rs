//! Helpers for files the tools generate.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

const RESERVED: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replace characters that are not allowed in file names on common
/// filesystems with `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

/// Append `bytes` to `path`, creating the file if needed.
pub fn append_file(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    file.write_all(bytes)?;
    file.flush()
}
