//! Image harvesting from journal PDFs.
//!
//! Images are written under `output_dir/{year}/` with names derived from the
//! PDF file name, e.g. `2019_p2-p3_img01.jpg` for `協会誌2019_p2-p3.pdf`.

use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use regex::Regex;
use resonance_utils::{atomic_write, sanitize_filename};
use thiserror::Error;

pub const IMAGE_LOG_FILE: &str = "抽出ログ.txt";

const MAX_PAGE_TREE_DEPTH: usize = 32;

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(20\d{2}|19\d{2})").expect("valid year regex"));
static PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[pP](\d+)[-_][pP]?(\d+)").expect("valid page range regex"));

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to list {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Year and page range parsed from a PDF file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLabel {
    pub year: String,
    pub pages: String,
}

#[must_use]
pub fn parse_source_name(stem: &str) -> SourceLabel {
    let year = YEAR
        .captures(stem)
        .map_or_else(|| "unknown".to_string(), |c| c[1].to_string());
    let pages = PAGES
        .captures(stem)
        .map_or_else(|| "full".to_string(), |c| format!("p{}-p{}", &c[1], &c[2]));
    SourceLabel { year, pages }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub filename: String,
    pub path: PathBuf,
    /// Stem of the PDF the image came from.
    pub source_pdf: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

impl ExtractedImage {
    #[must_use]
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

enum Encoded {
    Jpeg(Vec<u8>),
    Jpx(Vec<u8>),
    Png(Vec<u8>),
}

impl Encoded {
    fn ext(&self) -> &'static str {
        match self {
            Self::Jpeg(_) => "jpg",
            Self::Jpx(_) => "jp2",
            Self::Png(_) => "png",
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Self::Jpeg(b) | Self::Jpx(b) | Self::Png(b) => b,
        }
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.objects.get(id).unwrap_or(object),
        other => other,
    }
}

fn dict_u32(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match resolve(doc, dict.get(key).ok()?) {
        Object::Integer(n) => u32::try_from(*n).ok(),
        _ => None,
    }
}

fn dict_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match resolve(doc, dict.get(key).ok()?) {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

fn filters<'a>(doc: &'a Document, dict: &'a Dictionary) -> Vec<&'a [u8]> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Vec::new();
    };
    match resolve(doc, filter) {
        Object::Name(name) => vec![name.as_slice()],
        Object::Array(items) => items
            .iter()
            .filter_map(|item| match resolve(doc, item) {
                Object::Name(name) => Some(name.as_slice()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_image(doc: &Document, stream: &Stream) -> bool {
    dict_name(doc, &stream.dict, b"Subtype") == Some(b"Image".as_slice())
}

/// Object ids used as soft masks; those are alpha channels, not pictures.
fn soft_mask_ids(doc: &Document) -> HashSet<ObjectId> {
    doc.objects
        .values()
        .filter_map(|object| match object {
            Object::Stream(stream) if is_image(doc, stream) => match stream.dict.get(b"SMask") {
                Ok(Object::Reference(id)) => Some(*id),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// `/Resources` of a page, inherited from the page tree when the page has none.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return match resolve(doc, resources) {
                Object::Dictionary(dict) => Some(dict),
                _ => None,
            };
        }
        let Ok(Object::Reference(parent)) = node.get(b"Parent") else {
            return None;
        };
        node = doc.get_dictionary(*parent).ok()?;
    }
    None
}

fn collect_xobject_images(
    doc: &Document,
    resources: &Dictionary,
    seen: &mut HashSet<ObjectId>,
    images: &mut Vec<ObjectId>,
) {
    let Some(Object::Dictionary(xobjects)) = resources.get(b"XObject").ok().map(|o| resolve(doc, o))
    else {
        return;
    };
    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }
        let Some(Object::Stream(stream)) = doc.objects.get(id) else {
            continue;
        };
        match dict_name(doc, &stream.dict, b"Subtype") {
            Some(b"Image") => images.push(*id),
            Some(b"Form") => {
                if let Some(Object::Dictionary(inner)) =
                    stream.dict.get(b"Resources").ok().map(|o| resolve(doc, o))
                {
                    collect_xobject_images(doc, inner, seen, images);
                }
            }
            _ => {}
        }
    }
}

/// Image XObjects drawn by the pages, in page order, each id once.
///
/// Thumbnails and orphaned streams are never referenced from page resources.
fn page_images(doc: &Document) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for page_id in doc.get_pages().values() {
        if let Some(resources) = page_resources(doc, *page_id) {
            collect_xobject_images(doc, resources, &mut seen, &mut images);
        }
    }
    images
}

fn encode_raw(
    doc: &Document,
    stream: &Stream,
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<Encoded, String> {
    let bits = dict_u32(doc, &stream.dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(format!("unsupported bits per component {bits}"));
    }

    let (color, channels) = match dict_name(doc, &stream.dict, b"ColorSpace") {
        Some(b"DeviceRGB") => (image::ExtendedColorType::Rgb8, 3),
        Some(b"DeviceGray") => (image::ExtendedColorType::L8, 1),
        Some(other) => {
            return Err(format!(
                "unsupported color space {}",
                String::from_utf8_lossy(other)
            ));
        }
        None => return Err("unsupported color space".to_string()),
    };

    let Some(expected) = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels))
    else {
        return Err(format!("image dimensions too large ({width}x{height})"));
    };
    if pixels.len() < expected {
        return Err(format!(
            "pixel data too short ({} bytes, expected {expected})",
            pixels.len()
        ));
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels[..expected], width, height, color)
        .map_err(|e| e.to_string())?;
    Ok(Encoded::Png(png))
}

/// lopdf refuses to decode streams typed as images, so decode a copy without
/// the `/Subtype` entry. Predictors in `/DecodeParms` still apply.
fn inflate(stream: &Stream) -> Result<Vec<u8>, String> {
    let mut plain = stream.clone();
    plain.dict.remove(b"Subtype");
    plain.decompressed_content().map_err(|e| e.to_string())
}

fn encode(doc: &Document, stream: &Stream, width: u32, height: u32) -> Result<Encoded, String> {
    match filters(doc, &stream.dict).as_slice() {
        [b"DCTDecode"] => Ok(Encoded::Jpeg(stream.content.clone())),
        [b"JPXDecode"] => Ok(Encoded::Jpx(stream.content.clone())),
        [] => encode_raw(doc, stream, &stream.content, width, height),
        [b"FlateDecode"] => {
            let pixels = inflate(stream)?;
            encode_raw(doc, stream, &pixels, width, height)
        }
        other => Err(format!(
            "unsupported filter chain {:?}",
            other
                .iter()
                .map(|f| String::from_utf8_lossy(f).into_owned())
                .collect::<Vec<_>>()
        )),
    }
}

/// Extract every image of at least `min_dimension` pixels per side from `pdf`.
///
/// Failures are logged; an unreadable PDF yields an empty list.
#[must_use]
pub fn extract_images(pdf: &Path, output_dir: &Path, min_dimension: u32) -> Vec<ExtractedImage> {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let label = parse_source_name(&stem);
    let year_dir = output_dir.join(&label.year);

    let doc = match Document::load(pdf) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(pdf = %pdf.display(), "Failed to open PDF: {e}");
            return Vec::new();
        }
    };

    let masks = soft_mask_ids(&doc);
    let mut extracted = Vec::new();

    for id in page_images(&doc) {
        let Some(Object::Stream(stream)) = doc.objects.get(&id) else {
            continue;
        };
        if masks.contains(&id) {
            continue;
        }

        let (Some(width), Some(height)) = (
            dict_u32(&doc, &stream.dict, b"Width"),
            dict_u32(&doc, &stream.dict, b"Height"),
        ) else {
            tracing::warn!(pdf = %stem, object = ?id, "Image without dimensions");
            continue;
        };
        if width < min_dimension || height < min_dimension {
            tracing::debug!(pdf = %stem, object = ?id, width, height, "Skipping small image");
            continue;
        }

        let encoded = match encode(&doc, stream, width, height) {
            Ok(encoded) => encoded,
            Err(reason) => {
                tracing::warn!(pdf = %stem, object = ?id, "Skipping image: {reason}");
                continue;
            }
        };

        let filename = sanitize_filename(&format!(
            "{}_{}_img{:02}.{}",
            label.year,
            label.pages,
            extracted.len() + 1,
            encoded.ext()
        ));
        let path = year_dir.join(&filename);
        let written = std::fs::create_dir_all(&year_dir)
            .and_then(|()| std::fs::write(&path, encoded.bytes()));
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), "Failed to save image: {e}");
            continue;
        }

        extracted.push(ExtractedImage {
            filename,
            path,
            source_pdf: stem.clone(),
            width,
            height,
            size_bytes: encoded.bytes().len() as u64,
        });
    }

    tracing::info!(pdf = %stem, images = extracted.len(), "Extracted images");
    extracted
}

#[must_use]
pub fn render_image_log(images: &[ExtractedImage]) -> String {
    let mut out = String::from("# 抽出画像一覧\n\n");
    for img in images {
        let _ = writeln!(out, "ファイル名: {}", img.filename);
        let _ = writeln!(out, "  元PDF: {}", img.source_pdf);
        let _ = writeln!(
            out,
            "  サイズ: {}x{} ({:.1}KB)",
            img.width,
            img.height,
            img.size_kb()
        );
        let _ = writeln!(out, "  パス: {}", img.path.display());
        out.push('\n');
    }
    out
}

/// Write the log when anything was extracted. Returns its path.
pub fn write_image_log(
    output_dir: &Path,
    images: &[ExtractedImage],
) -> Result<Option<PathBuf>, ImageError> {
    if images.is_empty() {
        return Ok(None);
    }
    let path = output_dir.join(IMAGE_LOG_FILE);
    std::fs::create_dir_all(output_dir)
        .and_then(|()| atomic_write(&path, render_image_log(images).as_bytes()))
        .map_err(|source| ImageError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(Some(path))
}

/// PDFs to process: `names` inside `pdf_dir`, or every `*.pdf` there.
pub fn select_pdfs(pdf_dir: &Path, names: &[String]) -> Result<Vec<PathBuf>, ImageError> {
    if !names.is_empty() {
        return Ok(names
            .iter()
            .map(|name| pdf_dir.join(name))
            .filter(|path| {
                let exists = path.is_file();
                if !exists {
                    tracing::warn!(path = %path.display(), "Skipping PDF (not found)");
                }
                exists
            })
            .collect());
    }

    let entries = std::fs::read_dir(pdf_dir).map_err(|source| ImageError::ListDir {
        path: pdf_dir.to_path_buf(),
        source,
    })?;
    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}
