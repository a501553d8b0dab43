//! `profile check` and `profile render` end to end

use resonance_core::ProfileIssue;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{VALID_PROFILE, resonance, run, stderr, stdout, write_config};

#[test]
fn check_passes_clean_profile() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("profile.toml"), VALID_PROFILE).unwrap();
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["profile", "check"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("0 errors, 0 warnings"), "{}", stdout(&output));
}

#[test]
fn check_warnings_alone_pass() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("sparse.toml");
    std::fs::write(
        &profile,
        "[[organization]]\nid = \"npo\"\nname = \"Association\"\nkind = \"nonprofit\"\n",
    )
    .unwrap();
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["profile", "check", "--profile"])
        .arg(&profile)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("[warning] organization npo: founding year is missing"), "{out}");
    assert!(out.contains("0 errors, 5 warnings"), "{out}");
}

#[test]
fn check_fails_on_errors() {
    let dir = tempfile::tempdir().unwrap();
    let broken = VALID_PROFILE
        .replace("founded = 2009", "founded = 1850")
        .replace("owner = \"npo\"", "owner = \"ghost\"");
    std::fs::write(dir.path().join("profile.toml"), broken).unwrap();
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["profile", "check"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("[error] organization npo: founding year 1850"), "{out}");
    assert!(out.contains("owner `ghost` is not a known organization id"), "{out}");
    assert!(out.contains("2 errors"), "{out}");
}

#[test]
fn check_reports_unparseable_profile() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("profile.toml"), "[[organization]\n").unwrap();
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["profile", "check"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("profile.toml"), "{}", stderr(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn online_check_flags_broken_url() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let profile = VALID_PROFILE.replace(
        "https://example.org",
        &format!("{}/gone", server.uri()),
    );
    std::fs::write(dir.path().join("profile.toml"), profile).unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = resonance(dir.path());
    cmd.arg("--config")
        .arg(&config)
        .args(["profile", "check", "--online"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("[error] npo:"), "{out}");
    assert!(out.contains("broken (404 Not Found)"), "{out}");
}

#[tokio::test(flavor = "multi_thread")]
async fn online_check_accepts_reachable_url() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let profile = VALID_PROFILE.replace("https://example.org", &format!("{}/", server.uri()));
    std::fs::write(dir.path().join("profile.toml"), profile).unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = resonance(dir.path());
    cmd.arg("--config")
        .arg(&config)
        .args(["profile", "check", "--online"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("[ok] npo:"), "{}", stdout(&output));
}

#[test]
fn config_is_found_through_env_var() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("profile.toml"), VALID_PROFILE).unwrap();
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .env("RESONANCE_CONFIG", &config)
        .args(["profile", "check"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("0 errors"), "{}", stdout(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn online_check_skips_blank_and_unsupported_urls() {
    for (url, expected, code) in [
        ("", "0 errors, 1 warnings", 0),
        ("ftp://example.org", "1 errors, 0 warnings", 1),
    ] {
        let dir = tempfile::tempdir().unwrap();
        let profile = VALID_PROFILE.replace("https://example.org", url);
        std::fs::write(dir.path().join("profile.toml"), profile).unwrap();
        let config = write_config(dir.path(), "");

        let mut cmd = resonance(dir.path());
        cmd.arg("--config")
            .arg(&config)
            .args(["profile", "check", "--online"]);
        let output = run(cmd).await;

        let out = stdout(&output);
        assert_eq!(output.status.code(), Some(code), "{url:?}: {out}");
        assert!(!out.contains("] npo:"), "probed {url:?}: {out}");
        assert!(out.contains(expected), "{url:?}: {out}");
    }
}

#[test]
fn render_prints_briefing_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("profile.toml"), VALID_PROFILE).unwrap();
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["profile", "render"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("# Organization briefing"), "{out}");
    assert!(out.contains("## Sound Healing Association"));
    assert!(out.contains("| Instagram | @sound | Sound Healing Association | Session photos | - |"));
    assert!(out.contains("- **NPO**: Nonprofit organization"));
}

#[test]
fn render_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("profile.toml"), VALID_PROFILE).unwrap();
    let config = write_config(dir.path(), "");
    let target = dir.path().join("briefing.md");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["profile", "render", "--output"])
        .arg(&target)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());

    let written = std::fs::read_to_string(&target).unwrap();
    assert!(written.contains("## Commit convention"));
}

#[test]
fn bundled_demo_profile_has_no_errors() {
    let raw = include_str!("../../demos/profile.toml");
    let profile: resonance_types::Profile = toml::from_str(raw).unwrap();
    let issues = resonance_core::validate(&profile, 2026);
    assert!(!issues.iter().any(ProfileIssue::is_error), "{issues:?}");
}
