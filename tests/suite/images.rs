//! `images` command over generated journal PDFs

use resonance_ingest::{IMAGE_LOG_FILE, extract_images};

use crate::common::{resonance, stderr, stdout, write_config, write_image_pdf, write_text_pdf};

#[test]
fn library_names_images_after_source_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("協会誌2019_p2-p3.pdf");
    write_image_pdf(&pdf);

    let out = dir.path().join("out");
    let images = extract_images(&pdf, &out, 50);

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].filename, "2019_p2-p3_img01.jpg");
    assert_eq!(images[0].path, out.join("2019").join("2019_p2-p3_img01.jpg"));
    assert_eq!((images[0].width, images[0].height), (64, 64));
    assert!(images[0].path.is_file());
}

#[test]
fn binary_extracts_all_pdfs_and_writes_log() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_dir = dir.path().join("資料");
    std::fs::create_dir_all(&pdf_dir).unwrap();
    write_image_pdf(&pdf_dir.join("協会誌2019_p2-p3.pdf"));
    write_text_pdf(&pdf_dir.join("協会誌2020_full.pdf"), &["no pictures here"]);
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("images")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("total: 1 images from 2 PDFs"), "{out}");

    let log_path = dir.path().join("抽出画像").join(IMAGE_LOG_FILE);
    assert!(out.contains(&log_path.display().to_string()), "{out}");
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.starts_with("# 抽出画像一覧"));
    assert!(log.contains("ファイル名: 2019_p2-p3_img01.jpg"));
    assert!(log.contains("  元PDF: 協会誌2019_p2-p3"));
    assert!(log.contains("  サイズ: 64x64"));
}

#[test]
fn binary_honours_explicit_names_and_min_dimension() {
    let dir = tempfile::tempdir().unwrap();
    let pdf_dir = dir.path().join("journals");
    std::fs::create_dir_all(&pdf_dir).unwrap();
    write_image_pdf(&pdf_dir.join("協会誌2019_p2-p3.pdf"));
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["images", "--pdf-dir"])
        .arg(&pdf_dir)
        .args(["--output-dir", "pictures", "--min-dimension", "100"])
        .args(["協会誌2019_p2-p3.pdf", "absent.pdf"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("total: 0 images from 1 PDFs"), "{out}");
    assert!(out.contains("no images extracted"), "{out}");
    assert!(!dir.path().join("pictures").join(IMAGE_LOG_FILE).exists());
}

#[test]
fn binary_reports_missing_pdf_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = resonance(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("images")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("資料"), "{}", stderr(&output));
}
