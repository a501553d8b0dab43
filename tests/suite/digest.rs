//! Digest pipeline against a mocked Chat Completions endpoint

use std::path::Path;
use std::time::Duration;

use resonance_config::DigestSettings;
use resonance_ingest::{Digest, FolderCounts, FolderOutcome};
use resonance_providers::openai::OpenAiClient;
use resonance_providers::retry::RetryConfig;
use resonance_providers::{ApiConfig, ApiKey, ModelName};
use wiremock::MockServer;

use crate::common::{
    mount_chat_completion, mount_chat_error, resonance, run, stderr, stdout, write_config,
    write_docx, write_text_pdf,
};

/// `src/01_intro` with a TXT, a DOCX, a text PDF and a legacy `.doc`.
fn seed_sources(root: &Path) {
    let folder = root.join("src").join("01_intro");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("a_notes.txt"), "Quarterly report of the association").unwrap();
    write_docx(&folder.join("b_minutes.docx"), &["Board minutes", "Budget approved"]);
    write_text_pdf(&folder.join("c_journal.pdf"), &["Journal 2019 abstract"]);
    std::fs::write(folder.join("d_old.doc"), b"\xD0\xCF\x11\xE0").unwrap();
}

fn digest_config(root: &Path, server: &MockServer, with_key: bool) -> std::path::PathBuf {
    let keys = if with_key {
        "[api_keys]\nopenai = \"sk-test\"\n\n"
    } else {
        ""
    };
    write_config(
        root,
        &format!(
            "{keys}[openai]\nbase_url = \"{}/v1\"\nmax_retries = 0\n\n\
             [digest]\nsource_dir = \"src\"\noutput = \"digest.md\"\n\
             folders = [\"01_intro\", \"02_missing\"]\n",
            server.uri()
        ),
    )
}

#[tokio::test]
async fn library_digest_summarizes_and_records_skips() {
    let server = MockServer::start().await;
    mount_chat_completion(&server, "## 概要\nsummary").await;

    let dir = tempfile::tempdir().unwrap();
    seed_sources(dir.path());

    let config = ApiConfig::new(
        ApiKey::new("sk-test").unwrap(),
        ModelName::parse("gpt-4o-mini").unwrap(),
    )
    .with_base_url(format!("{}/v1", server.uri()))
    .with_retry(RetryConfig::default().with_max_retries(0));
    let client = OpenAiClient::new(config).unwrap();

    let settings = DigestSettings {
        source_dir: dir.path().join("src"),
        output: dir.path().join("digest.md"),
        folders: Vec::new(),
        request_interval: Duration::ZERO,
        max_chars: 15_000,
    };
    let report = Digest::new(&client, &settings)
        .run(&["01_intro".to_string(), "02_missing".to_string()])
        .await
        .unwrap();

    assert_eq!(
        report.folders[0].outcome,
        FolderOutcome::Processed(FolderCounts {
            summarized: 3,
            skipped: 1,
            failed: 0,
        })
    );
    assert_eq!(report.folders[1].outcome, FolderOutcome::Missing);
    assert!(report.first_error.is_none());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let first = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(first.contains("a_notes.txt"), "{first}");
    assert!(first.contains("Quarterly report of the association"), "{first}");

    let written = std::fs::read_to_string(dir.path().join("digest.md")).unwrap();
    assert!(written.starts_with("# 資料まとめ（API処理結果）"));
    assert!(written.contains("OpenAI gpt-4o-mini による自動処理結果"));
    assert!(written.contains("# 01_intro"));
    assert!(!written.contains("# 02_missing"));
    assert_eq!(written.matches("## 概要").count(), 3);
    assert!(written.contains("## d_old.doc\n\n**エラー**: ["), "{written}");
}

#[tokio::test(flavor = "multi_thread")]
async fn binary_prints_folder_summary() {
    let server = MockServer::start().await;
    mount_chat_completion(&server, "## 概要\nsummary").await;

    let dir = tempfile::tempdir().unwrap();
    seed_sources(dir.path());
    let config = digest_config(dir.path(), &server, true);

    let mut cmd = resonance(dir.path());
    cmd.arg("--config")
        .arg(&config)
        .args(["digest", "--interval-ms", "0"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("01_intro: 3 summarized, 1 skipped, 0 failed"), "{out}");
    assert!(out.contains("02_missing: not found"), "{out}");
    assert!(out.contains("total: 4 files"), "{out}");
    assert!(dir.path().join("digest.md").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn binary_explains_auth_failure() {
    let server = MockServer::start().await;
    mount_chat_error(
        &server,
        401,
        r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("src").join("01_intro");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("notes.txt"), "text").unwrap();
    let config = digest_config(dir.path(), &server, true);

    let mut cmd = resonance(dir.path());
    cmd.arg("--config")
        .arg(&config)
        .args(["digest", "--interval-ms", "0", "01_intro"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("[API error]"), "{err}");
    assert!(err.contains("OPENAI_API_KEY"), "{err}");

    let written = std::fs::read_to_string(dir.path().join("digest.md")).unwrap();
    assert!(
        written.contains("**APIエラー**: 401 Unauthorized: Incorrect API key provided"),
        "{written}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn binary_requires_api_key() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    seed_sources(dir.path());
    let config = digest_config(dir.path(), &server, false);

    let mut cmd = resonance(dir.path());
    cmd.arg("--config").arg(&config).arg("digest");
    let output = run(cmd).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no OpenAI API key"), "{}", stderr(&output));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!dir.path().join("digest.md").exists());
}
