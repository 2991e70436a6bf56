use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "reportlens.toml";
pub const ENV_PREFIX: &str = "REPORTLENS_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a JSON request body; uploads arrive base64-encoded.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://reportlens.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable.
    pub tesseract_cmd: String,

    /// Poppler `pdftoppm` executable used to rasterize pages.
    pub pdftoppm_cmd: String,

    /// Tesseract language list (e.g. "eng" or "eng+afr").
    pub languages: String,

    /// Page upscaling factor relative to the 72 DPI PDF user space.
    pub render_scale: f32,

    /// Grayscale/contrast/threshold pass on low-contrast pages.
    pub preprocessing_enabled: bool,

    /// Upper bound on pages recognized at the same time.
    pub max_concurrent_pages: usize,

    pub page_timeout_secs: u64,
    pub render_timeout_secs: u64,
}

impl OcrConfig {
    pub fn render_dpi(&self) -> u32 {
        (72.0 * self.render_scale.max(0.1)).round() as u32
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            pdftoppm_cmd: "pdftoppm".to_string(),
            languages: "eng".to_string(),
            render_scale: 2.0,
            preprocessing_enabled: true,
            max_concurrent_pages: 4,
            page_timeout_secs: 60,
            render_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// A text layer must be longer than this (after trimming) to skip OCR.
    pub min_text_chars: usize,
    pub llm_timeout_secs: u64,
    pub max_weaknesses: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 20,
            llm_timeout_secs: 120,
            max_weaknesses: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub extraction: LLMConfig,
    pub analysis: LLMConfig,
    pub ocr: OcrConfig,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            extraction: LLMConfig::extraction_default(),
            analysis: LLMConfig::analysis_default(),
            ocr: OcrConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

pub struct ConfigService;

impl ConfigService {
    /// Defaults, then `reportlens.toml` in the working directory, then
    /// `REPORTLENS_*` environment variables (`__` separates nested keys).
    pub fn load() -> Result<AppConfig> {
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<AppConfig> {
        let mut config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        Self::fill_api_key(&mut config.extraction);
        Self::fill_api_key(&mut config.analysis);
        Self::validate(&config)?;
        Ok(config)
    }

    fn fill_api_key(llm: &mut LLMConfig) {
        if llm.api_key.as_deref().map(str::trim).unwrap_or("").is_empty() {
            let var = match llm.provider {
                LLMProvider::OpenAI => "OPENAI_API_KEY",
                LLMProvider::Google => "GEMINI_API_KEY",
            };
            llm.api_key = std::env::var(var).ok().filter(|k| !k.trim().is_empty());
        }
    }

    fn validate(config: &AppConfig) -> Result<()> {
        if config.ocr.max_concurrent_pages == 0 {
            return Err(AppError::ConfigError(
                "ocr.max_concurrent_pages must be at least 1".to_string(),
            ));
        }
        if config.pipeline.max_weaknesses == 0 {
            return Err(AppError::ConfigError(
                "pipeline.max_weaknesses must be at least 1".to_string(),
            ));
        }
        if !(config.ocr.render_scale > 0.0) {
            return Err(AppError::ConfigError(
                "ocr.render_scale must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
