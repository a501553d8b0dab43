//! Commit message convention.
//!
//! ```text
//! <type>: <summary>
//!
//! optional body
//!
//! Co-Authored-By: Name <email>
//! ```
//!
//! `<type>` is one of [`CommitType::ALL`], matched exactly. Every violation is
//! reported, so a hook can print the full list in one pass.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use resonance_types::{CommitType, UnknownCommitType};
use thiserror::Error;

const CO_AUTHOR_KEY: &str = "co-authored-by:";

static CO_AUTHOR_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^<>]*\S)\s*<(?P<email>[^<>\s@]+@[^<>\s@]+)>$")
        .expect("valid co-author regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoAuthor {
    pub name: String,
    pub email: String,
}

impl fmt::Display for CoAuthor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A message that satisfies the convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub kind: CommitType,
    pub summary: String,
    /// Lines between the header and the trailers, blank edges trimmed.
    pub body: String,
    pub co_authors: Vec<CoAuthor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintError {
    #[error("commit message is empty")]
    Empty,
    #[error("header `{0}` does not match `<type>: <summary>`")]
    MalformedHeader(String),
    #[error(transparent)]
    UnknownType(#[from] UnknownCommitType),
    #[error("expected exactly one space after `:` in the header")]
    Spacing,
    #[error("summary is empty")]
    EmptySummary,
    #[error("missing `Co-Authored-By: Name <email>` line")]
    MissingCoAuthor,
    #[error("malformed co-author line `{0}` (expected `Co-Authored-By: Name <email>`)")]
    MalformedCoAuthor(String),
}

/// `git commit -v` appends the diff below this marker; nothing after it is message.
fn is_scissors(line: &str) -> bool {
    line.starts_with('#') && line.contains(" >8 ")
}

fn meaningful_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(|line| line.trim_end_matches('\r'))
        .take_while(|line| !is_scissors(line))
        .filter(|line| !line.starts_with('#'))
        .skip_while(|line| line.trim().is_empty())
        .collect()
}

fn co_author_value(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let key = trimmed.get(..CO_AUTHOR_KEY.len())?;
    key.eq_ignore_ascii_case(CO_AUTHOR_KEY)
        .then(|| trimmed[CO_AUTHOR_KEY.len()..].trim())
}

fn parse_co_author(value: &str) -> Option<CoAuthor> {
    let caps = CO_AUTHOR_VALUE.captures(value)?;
    Some(CoAuthor {
        name: caps["name"].trim().to_string(),
        email: caps["email"].to_string(),
    })
}

fn lint_header(header: &str, errors: &mut Vec<LintError>) -> Option<(CommitType, String)> {
    let Some((token, rest)) = header.split_once(':') else {
        errors.push(LintError::MalformedHeader(header.to_string()));
        return None;
    };

    let kind = match CommitType::parse(token) {
        Ok(kind) => Some(kind),
        Err(e) => {
            errors.push(e.into());
            None
        }
    };

    let summary = rest.trim();
    if summary.is_empty() {
        errors.push(LintError::EmptySummary);
    } else if !rest.starts_with(' ') || rest.starts_with("  ") {
        errors.push(LintError::Spacing);
    }

    kind.filter(|_| !summary.is_empty())
        .map(|kind| (kind, summary.to_string()))
}

/// Check `raw` against the convention, collecting every violation.
pub fn lint_commit_message(raw: &str) -> Result<CommitMessage, Vec<LintError>> {
    let lines = meaningful_lines(raw);
    let Some((header, rest)) = lines.split_first() else {
        return Err(vec![LintError::Empty]);
    };

    let mut errors = Vec::new();
    let header = lint_header(header, &mut errors);

    let mut co_authors = Vec::new();
    let mut body_lines = Vec::new();
    for line in rest {
        match co_author_value(line) {
            Some(value) => match parse_co_author(value) {
                Some(author) => co_authors.push(author),
                None => errors.push(LintError::MalformedCoAuthor(line.trim().to_string())),
            },
            None => body_lines.push(*line),
        }
    }

    let saw_malformed = errors
        .iter()
        .any(|e| matches!(e, LintError::MalformedCoAuthor(_)));
    if co_authors.is_empty() && !saw_malformed {
        errors.push(LintError::MissingCoAuthor);
    }

    match header {
        Some((kind, summary)) if errors.is_empty() => Ok(CommitMessage {
            kind,
            summary,
            body: body_lines.join("\n").trim_matches('\n').trim().to_string(),
            co_authors,
        }),
        _ => Err(errors),
    }
}
