//! Commit convention: library verdicts and the `commit-lint` hook command

use std::io::Write;
use std::process::Stdio;

use resonance_core::{LintError, lint_commit_message};
use resonance_types::CommitType;

use crate::common::{resonance, stderr};

const GOOD: &str = "feat: add briefing renderer\n\nRenders the profile as Markdown.\n\nCo-Authored-By: Aki Tanaka <aki@example.org>\n";

#[test]
fn accepts_message_written_by_git() {
    let raw = format!("{GOOD}# Please enter the commit message for your changes.\n#\n");
    let message = lint_commit_message(&raw).unwrap();
    assert_eq!(message.kind, CommitType::Feat);
    assert_eq!(message.summary, "add briefing renderer");
    assert_eq!(message.co_authors.len(), 1);
    assert_eq!(message.co_authors[0].to_string(), "Aki Tanaka <aki@example.org>");
}

#[test]
fn reports_every_violation_at_once() {
    let errors = lint_commit_message("Feature:add thing\n").unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, LintError::UnknownType(_))));
    assert!(errors.contains(&LintError::Spacing));
    assert!(errors.contains(&LintError::MissingCoAuthor));
}

#[test]
fn hook_passes_valid_message_file() {
    let dir = tempfile::tempdir().unwrap();
    let msg = dir.path().join("COMMIT_EDITMSG");
    std::fs::write(&msg, GOOD).unwrap();

    let output = resonance(dir.path())
        .arg("commit-lint")
        .arg(&msg)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn hook_rejects_message_with_one_line_per_violation() {
    let dir = tempfile::tempdir().unwrap();
    let msg = dir.path().join("COMMIT_EDITMSG");
    std::fs::write(&msg, "wip: stuff\n").unwrap();

    let output = resonance(dir.path())
        .arg("commit-lint")
        .arg(&msg)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let err = stderr(&output);
    let violations: Vec<&str> = err
        .lines()
        .filter(|line| line.contains("unknown commit type") || line.contains("Co-Authored-By"))
        .collect();
    assert_eq!(violations.len(), 2, "{err}");
}

#[test]
fn hook_reads_stdin_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = resonance(dir.path())
        .arg("commit-lint")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(GOOD.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
}
