//! Domain logic for Resonance that does not touch the network or documents:
//! the commit convention, profile validation with briefing rendering, and
//! formatting of API errors for humans.

pub mod briefing;
pub mod conventions;
pub mod errors;

pub use briefing::{
    ProfileError, ProfileIssue, Severity, load_profile, reachable_candidate, render_briefing,
    validate,
};
pub use conventions::{CoAuthor, CommitMessage, LintError, lint_commit_message};
pub use errors::{format_api_error, summarize_api_error};
