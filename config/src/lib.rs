//! Configuration for the Resonance tools.
//!
//! Settings come from `~/.resonance/config.toml` (or the file named by
//! `RESONANCE_CONFIG`), are overridden by command-line flags, and fall back to
//! built-in defaults. Every section is optional:
//!
//! ```toml
//! [app]
//! workspace = "/home/me/outreach"
//!
//! [api_keys]
//! openai = "${OPENAI_API_KEY}"
//!
//! [openai]
//! model = "gpt-4o-mini"
//! max_tokens = 1500
//! temperature = 0.3
//!
//! [digest]
//! folders = ["1_学会発表論文", "2_体験談推薦文"]
//! request_interval_ms = 1000
//!
//! [images]
//! min_dimension = 50
//! ```
//!
//! Relative paths are resolved against `[app].workspace`, which itself
//! defaults to the current directory.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use resonance_types::{ApiKey, ModelName};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "RESONANCE_CONFIG";
pub const OPENAI_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

pub const DEFAULT_DIGEST_SOURCE_DIR: &str = "ChatGPT処理用";
pub const DEFAULT_DIGEST_OUTPUT: &str = "資料まとめ_API処理結果.md";
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_MAX_CHARS: usize = 15_000;

pub const DEFAULT_PDF_DIR: &str = "資料";
pub const DEFAULT_IMAGE_OUTPUT_DIR: &str = "抽出画像";
pub const DEFAULT_MIN_DIMENSION: u32 = 50;

pub const DEFAULT_PROFILE_PATH: &str = "profile.toml";

/// Source folders in processing priority order.
pub const DEFAULT_DIGEST_FOLDERS: [&str; 10] = [
    "1_学会発表論文",
    "2_体験談推薦文",
    "3_解説原稿",
    "4_協会誌詳細",
    "5_スターライトヒーリング",
    "6_CD_書籍関連",
    "7_メディア掲載",
    "8_体感音響",
    "9_自然音エビデンス",
    "10_その他",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResonanceConfig {
    pub app: Option<AppConfig>,
    pub api_keys: Option<ApiKeys>,
    pub openai: Option<OpenAIConfig>,
    pub digest: Option<DigestConfig>,
    pub images: Option<ImagesConfig>,
    pub profile: Option<ProfileConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Base directory for every relative path below.
    pub workspace: Option<PathBuf>,
}

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    pub openai: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let openai = if self.openai.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("ApiKeys").field("openai", &openai).finish()
    }
}

/// Chat Completions request defaults.
#[derive(Debug, Default, Deserialize)]
pub struct OpenAIConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DigestConfig {
    pub source_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub folders: Option<Vec<String>>,
    /// Pause after each successful model call.
    pub request_interval_ms: Option<u64>,
    /// Character budget for extracted text sent to the model.
    pub max_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImagesConfig {
    pub pdf_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Images narrower or shorter than this (in pixels) are treated as icons.
    pub min_dimension: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileConfig {
    pub path: Option<PathBuf>,
}

/// Fully-defaulted view of `[openai]`.
#[derive(Debug, Clone)]
pub struct OpenAISettings {
    pub model: ModelName,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Fully-defaulted view of `[digest]`.
#[derive(Debug, Clone)]
pub struct DigestSettings {
    pub source_dir: PathBuf,
    pub output: PathBuf,
    pub folders: Vec<String>,
    pub request_interval: Duration,
    pub max_chars: usize,
}

/// Fully-defaulted view of `[images]`.
#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub pdf_dir: PathBuf,
    pub output_dir: PathBuf,
    pub min_dimension: u32,
}

#[derive(Debug, Clone)]
pub struct ProfileSettings {
    pub path: PathBuf,
}

/// Expand `${VAR}` references using the process environment.
///
/// Missing variables expand to the empty string; `${}` and unclosed `${`
/// are kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    expand_env_vars_with(value, |name| env::var(name).ok())
}

/// [`expand_env_vars`] with an explicit variable lookup.
pub fn expand_env_vars_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(0) => {
                out.push_str("${}");
                rest = &after[1..];
            }
            Some(end) => {
                out.push_str(&lookup(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Load `.env` from the working directory (or a parent) if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env: {e}"),
    }
}

impl ResonanceConfig {
    /// Load the default config file. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// Load an explicit config file. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn workspace(&self) -> PathBuf {
        self.app
            .as_ref()
            .and_then(|app| app.workspace.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn in_workspace(&self, configured: Option<&PathBuf>, default: &str) -> PathBuf {
        let path = configured.cloned().unwrap_or_else(|| PathBuf::from(default));
        if path.is_absolute() {
            path
        } else {
            self.workspace().join(path)
        }
    }

    pub fn openai_settings(&self) -> Result<OpenAISettings, ConfigError> {
        let section = self.openai.as_ref();

        let model = match section.and_then(|s| s.model.as_deref()) {
            Some(raw) => ModelName::parse(raw).map_err(|_| ConfigError::Invalid {
                field: "openai.model",
                reason: "model name must not be empty".to_string(),
            })?,
            None => ModelName::default(),
        };

        let max_tokens = section
            .and_then(|s| s.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "openai.max_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }

        let temperature = section
            .and_then(|s| s.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                field: "openai.temperature",
                reason: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let base_url = section
            .and_then(|s| s.base_url.as_deref())
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

        Ok(OpenAISettings {
            model,
            base_url,
            max_tokens,
            temperature,
            timeout: Duration::from_secs(
                section
                    .and_then(|s| s.timeout_seconds)
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_retries: section
                .and_then(|s| s.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }

    #[must_use]
    pub fn digest_settings(&self) -> DigestSettings {
        let section = self.digest.as_ref();
        let folders = section
            .and_then(|s| s.folders.clone())
            .filter(|folders| !folders.is_empty())
            .unwrap_or_else(|| DEFAULT_DIGEST_FOLDERS.iter().map(ToString::to_string).collect());

        DigestSettings {
            source_dir: self.in_workspace(
                section.and_then(|s| s.source_dir.as_ref()),
                DEFAULT_DIGEST_SOURCE_DIR,
            ),
            output: self.in_workspace(section.and_then(|s| s.output.as_ref()), DEFAULT_DIGEST_OUTPUT),
            folders,
            request_interval: Duration::from_millis(
                section
                    .and_then(|s| s.request_interval_ms)
                    .unwrap_or(DEFAULT_REQUEST_INTERVAL_MS),
            ),
            max_chars: section
                .and_then(|s| s.max_chars)
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CHARS),
        }
    }

    #[must_use]
    pub fn image_settings(&self) -> ImageSettings {
        let section = self.images.as_ref();
        ImageSettings {
            pdf_dir: self.in_workspace(section.and_then(|s| s.pdf_dir.as_ref()), DEFAULT_PDF_DIR),
            output_dir: self.in_workspace(
                section.and_then(|s| s.output_dir.as_ref()),
                DEFAULT_IMAGE_OUTPUT_DIR,
            ),
            min_dimension: section
                .and_then(|s| s.min_dimension)
                .unwrap_or(DEFAULT_MIN_DIMENSION),
        }
    }

    #[must_use]
    pub fn profile_settings(&self) -> ProfileSettings {
        ProfileSettings {
            path: self.in_workspace(
                self.profile.as_ref().and_then(|s| s.path.as_ref()),
                DEFAULT_PROFILE_PATH,
            ),
        }
    }

    /// Resolve the OpenAI key: `[api_keys].openai` first, then `OPENAI_API_KEY`.
    #[must_use]
    pub fn resolve_openai_key(&self) -> Option<ApiKey> {
        self.resolve_openai_key_with(|name| env::var(name).ok())
    }

    pub fn resolve_openai_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<ApiKey> {
        let from_config = self
            .api_keys
            .as_ref()
            .and_then(|keys| keys.openai.as_deref())
            .map(|raw| expand_env_vars_with(raw, &lookup))
            .and_then(|raw| ApiKey::new(raw).ok());

        from_config.or_else(|| lookup(OPENAI_KEY_ENV_VAR).and_then(|raw| ApiKey::new(raw).ok()))
    }
}

/// `$RESONANCE_CONFIG`, else `~/.resonance/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(CONFIG_ENV_VAR)
        && !explicit.trim().is_empty()
    {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".resonance").join("config.toml"))
}
