//! Organization profile checks and the Markdown briefing rendered from it.

use std::collections::HashSet;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

use resonance_types::{CommitType, Organization, Profile};
use thiserror::Error;
use url::Url;

const EARLIEST_FOUNDING_YEAR: i32 = 1900;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse profile {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn load_profile(path: &Path) -> Result<Profile, ProfileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileIssue {
    pub severity: Severity,
    /// What the issue is about, e.g. `organization npo` or `channel #2`.
    pub subject: String,
    pub message: String,
}

impl ProfileIssue {
    fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }

    fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ProfileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity.label(), self.subject, self.message)
    }
}

fn organization_subject(org: &Organization, index: usize) -> String {
    if org.id.trim().is_empty() {
        format!("organization #{}", index + 1)
    } else {
        format!("organization {}", org.id)
    }
}

fn blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn web_url(raw: &str) -> Result<Url, String> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        Ok(url) => Err(format!(
            "url `{raw}` uses unsupported scheme `{}`",
            url.scheme()
        )),
        Err(e) => Err(format!("url `{raw}` is invalid: {e}")),
    }
}

/// The organization's URL when present and valid; only these are worth probing.
#[must_use]
pub fn reachable_candidate(org: &Organization) -> Option<&str> {
    let raw = org.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
    web_url(raw).ok().map(|_| raw)
}

fn validate_organization(
    org: &Organization,
    subject: &str,
    current_year: i32,
    issues: &mut Vec<ProfileIssue>,
) {
    if org.id.trim().is_empty() {
        issues.push(ProfileIssue::error(subject, "id is empty"));
    }
    if org.name.trim().is_empty() {
        issues.push(ProfileIssue::error(subject, "name is empty"));
    }

    match org.founded {
        Some(year) if !(EARLIEST_FOUNDING_YEAR..=current_year).contains(&year) => {
            issues.push(ProfileIssue::error(
                subject,
                format!(
                    "founding year {year} is outside {EARLIEST_FOUNDING_YEAR}..={current_year}"
                ),
            ));
        }
        Some(_) => {}
        None => issues.push(ProfileIssue::warning(subject, "founding year is missing")),
    }

    match org.url.as_deref().map(str::trim) {
        None | Some("") => issues.push(ProfileIssue::warning(subject, "url is missing")),
        Some(raw) => {
            if let Err(reason) = web_url(raw) {
                issues.push(ProfileIssue::error(subject, reason));
            }
        }
    }

    if blank(org.representative.as_ref()) {
        issues.push(ProfileIssue::warning(subject, "representative is missing"));
    }
    if blank(org.address.as_ref()) {
        issues.push(ProfileIssue::warning(subject, "address is missing"));
    }
    if org.services.iter().all(|s| s.trim().is_empty()) {
        issues.push(ProfileIssue::warning(subject, "no services listed"));
    }
    for event in &org.events {
        if event.name.trim().is_empty() {
            issues.push(ProfileIssue::error(subject, "recurring event has an empty name"));
        }
    }
}

/// Check a profile for editorial mistakes. Issues come back in profile order.
#[must_use]
pub fn validate(profile: &Profile, current_year: i32) -> Vec<ProfileIssue> {
    let mut issues = Vec::new();

    if profile.organizations.is_empty() {
        issues.push(ProfileIssue::error("profile", "no organizations defined"));
    }

    let mut seen_ids = HashSet::new();
    for (index, org) in profile.organizations.iter().enumerate() {
        let subject = organization_subject(org, index);
        validate_organization(org, &subject, current_year, &mut issues);
        if !org.id.trim().is_empty() && !seen_ids.insert(org.id.as_str()) {
            issues.push(ProfileIssue::error(&subject, "duplicate organization id"));
        }
    }

    let mut seen_channels = HashSet::new();
    for (index, channel) in profile.channels.iter().enumerate() {
        let subject = format!("channel #{} ({})", index + 1, channel.platform.display_name());

        if let Some(owner) = channel.owner.as_deref()
            && profile.organization(owner).is_none()
        {
            issues.push(ProfileIssue::error(
                &subject,
                format!("owner `{owner}` is not a known organization id"),
            ));
        }
        if !seen_channels.insert((channel.platform, channel.owner.as_deref())) {
            issues.push(ProfileIssue::error(
                &subject,
                "duplicate channel for this platform and owner",
            ));
        }
        if channel.style.trim().is_empty() {
            issues.push(ProfileIssue::error(&subject, "content style is empty"));
        }
    }

    tracing::debug!(
        organizations = profile.organizations.len(),
        channels = profile.channels.len(),
        issues = issues.len(),
        "Validated profile"
    );
    issues
}

fn push_fact(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        let _ = writeln!(out, "- {label}: {value}");
    }
}

fn table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn render_organization(out: &mut String, org: &Organization) {
    let _ = writeln!(out, "## {}\n", org.name.trim());
    let _ = writeln!(out, "- Type: {}", org.kind.label());
    push_fact(out, "Founded", org.founded.map(|y| y.to_string()).as_deref());
    push_fact(out, "Representative", org.representative.as_deref());
    push_fact(out, "Address", org.address.as_deref());
    push_fact(out, "Website", org.url.as_deref());

    if !org.services.is_empty() {
        out.push_str("\n### Services\n\n");
        for service in &org.services {
            let _ = writeln!(out, "- {service}");
        }
    }

    if !org.events.is_empty() {
        out.push_str("\n### Recurring events\n\n");
        for event in &org.events {
            let _ = write!(out, "- **{}**", event.name);
            if let Some(schedule) = event.schedule.as_deref() {
                let _ = write!(out, " ({schedule})");
            }
            if !event.description.trim().is_empty() {
                let _ = write!(out, ": {}", event.description.trim());
            }
            out.push('\n');
        }
    }
    out.push('\n');
}

/// Render the profile as a Markdown briefing for people (or assistants)
/// writing on the organizations' behalf.
#[must_use]
pub fn render_briefing(profile: &Profile) -> String {
    let mut out = String::from("# Organization briefing\n\n");

    for org in &profile.organizations {
        render_organization(&mut out, org);
    }

    if !profile.channels.is_empty() {
        out.push_str("## SNS plan\n\n");
        out.push_str("| Platform | Account | Owner | Content style | Cadence |\n");
        out.push_str("|---|---|---|---|---|\n");
        for channel in &profile.channels {
            let owner = channel
                .owner
                .as_deref()
                .map(|id| profile.organization(id).map_or(id, |org| org.name.as_str()))
                .unwrap_or("-");
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                channel.platform.display_name(),
                table_cell(channel.handle.as_deref().unwrap_or("-")),
                table_cell(owner),
                table_cell(&channel.style),
                table_cell(channel.cadence.as_deref().unwrap_or("-")),
            );
        }
        out.push('\n');
    }

    out.push_str("## Commit convention\n\n");
    out.push_str("Header: `<type>: <summary>` where `<type>` is one of ");
    let types: Vec<String> = CommitType::ALL.iter().map(|t| format!("`{t}`")).collect();
    out.push_str(&types.join(", "));
    out.push_str(".\n\nEvery commit carries a `Co-Authored-By: Name <email>` line.\n");

    if !profile.glossary.is_empty() {
        out.push_str("\n## Glossary\n\n");
        for (term, definition) in &profile.glossary {
            let _ = writeln!(out, "- **{term}**: {definition}");
        }
    }

    out
}
