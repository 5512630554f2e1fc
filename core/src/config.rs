use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::geometry::{ImageLayout, ShapeBox};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub images: ImageSearchConfig,
    pub insertion: InsertionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub language: String,
    pub deck_temperature: f64,
    pub keyword_temperature: f64,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.mistral.ai/v1".to_string(),
            model: "mistral-large-latest".to_string(),
            language: "en".to_string(),
            deck_temperature: 0.7,
            keyword_temperature: 0.3,
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSearchConfig {
    /// `unsplash` or `pexels`.
    pub provider: String,
    pub unsplash_access_key: Option<String>,
    pub pexels_api_key: Option<String>,
    /// Unset means the provider's own default (4 for Unsplash, 3 for Pexels).
    pub page_size: Option<u32>,
    pub timeout_ms: u64,
}

impl Default for ImageSearchConfig {
    fn default() -> Self {
        Self {
            provider: "unsplash".to_string(),
            unsplash_access_key: None,
            pexels_api_key: None,
            page_size: None,
            timeout_ms: 20_000,
        }
    }
}

impl ImageSearchConfig {
    pub fn api_key(&self) -> Option<&str> {
        match self.provider.as_str() {
            "pexels" => self.pexels_api_key.as_deref(),
            _ => self.unsplash_access_key.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertionConfig {
    /// Layout used for the first slide.
    pub title_layout: String,
    /// Layout used for every other slide.
    pub content_layout: String,
    /// Box used when the native writer attaches a slide's image.
    pub image_box: ShapeBox,
    pub image_layout: ImageLayout,
    pub host_batch_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            title_layout: "Title Slide".to_string(),
            content_layout: "Title and Content".to_string(),
            image_box: ShapeBox::new(100.0, 200.0, 300.0, 200.0),
            image_layout: ImageLayout::default(),
            host_batch_timeout_ms: 30_000,
            fetch_timeout_ms: 20_000,
        }
    }
}

impl InsertionConfig {
    pub fn host_batch_timeout(&self) -> Duration {
        Duration::from_millis(self.host_batch_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;

        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(serde_json::from_str(&contents)?)
        }
    }

    /// Load configuration with default fallback
    pub fn load_with_fallback() -> Self {
        let config_paths = [
            ".slide/config.toml",
            ".slide/config.json",
            "slide.config.toml",
            "slide.config.json",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::load_from_file(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {path}");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {path}: {e}");
                    }
                }
            }
        }

        tracing::info!("Using default configuration");
        Self::default()
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Environment overrides, applied after the file.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|v| !v.is_empty());

        if let Some(key) = var("MISTRAL_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = var("SLIDE_MODEL") {
            self.llm.model = model;
        }
        if let Some(base) = var("SLIDE_API_BASE") {
            self.llm.base_url = base;
        }
        if let Some(language) = var("SLIDE_LANGUAGE") {
            self.llm.language = language;
        }
        if let Some(key) = var("UNSPLASH_ACCESS_KEY") {
            self.images.unsplash_access_key = Some(key);
        }
        if let Some(key) = var("PEXELS_API_KEY") {
            self.images.pexels_api_key = Some(key);
        }
    }
}
