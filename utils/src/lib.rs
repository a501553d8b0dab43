//! Shared file utilities for Resonance.
//!
//! - **`atomic_write`**: crash-safe replacement of generated reports (temp + rename)
//! - **`files`**: append helper and file-name sanitizing for extracted images

pub mod atomic_write;
pub mod files;

pub use atomic_write::atomic_write;
pub use files::{append_file, sanitize_filename};
