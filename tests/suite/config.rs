//! Config file handling as seen from the binary and the library

use std::path::PathBuf;
use std::time::Duration;

use resonance_config::ResonanceConfig;

use crate::common::{resonance, stderr, write_config};

#[test]
fn relative_paths_resolve_against_workspace() {
    let config: ResonanceConfig = toml::from_str(
        r#"
[app]
workspace = "/srv/outreach"

[digest]
output = "digest.md"
request_interval_ms = 0

[images]
output_dir = "/tmp/images"
"#,
    )
    .unwrap();

    let digest = config.digest_settings();
    assert_eq!(digest.output, PathBuf::from("/srv/outreach/digest.md"));
    assert_eq!(digest.request_interval, Duration::ZERO);
    assert_eq!(config.image_settings().output_dir, PathBuf::from("/tmp/images"));
    assert_eq!(
        config.profile_settings().path,
        PathBuf::from("/srv/outreach/profile.toml")
    );
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let output = resonance(dir.path())
        .args(["--config", "missing.toml", "profile", "render"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing.toml"), "{}", stderr(&output));
}

#[test]
fn malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[openai\nmodel = ");
    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["profile", "render"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load config"), "{}", stderr(&output));
}
