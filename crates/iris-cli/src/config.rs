//! Configuration file support

use iris_ai::Provider;
use iris_session::NormalizeOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for iris
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vision model id
    pub model: Option<String>,
    /// Provider (groq, openai, openrouter, custom)
    pub provider: Option<String>,
    /// Override the provider's API base URL
    pub base_url: Option<String>,
    /// Seconds to wait for an answer before giving up
    pub timeout_secs: Option<u64>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Cap on answer length
    pub max_tokens: Option<u32>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Color theme (dark, light)
    pub theme: Option<String>,
    /// Image normalization limits
    #[serde(default)]
    pub image: ImageSettings,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// Overrides for the upload normalizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub max_dimension: Option<u32>,
    pub jpeg_quality: Option<u8>,
    pub max_bytes: Option<usize>,
}

impl ImageSettings {
    /// Apply the overrides on top of `base`. Size limits can only be tightened.
    pub fn apply(&self, base: NormalizeOptions) -> NormalizeOptions {
        NormalizeOptions {
            max_dimension: self
                .max_dimension
                .map_or(base.max_dimension, |d| d.clamp(1, base.max_dimension)),
            jpeg_quality: self.jpeg_quality.unwrap_or(base.jpeg_quality).clamp(1, 100),
            max_bytes: self.max_bytes.map_or(base.max_bytes, |b| b.min(base.max_bytes)),
        }
    }
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub groq: Option<String>,
    pub openai: Option<String>,
    pub openrouter: Option<String>,
    pub custom: Option<String>,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("iris")
    }

    /// `$IRIS_CONFIG_PATH`, else `<config dir>/iris/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("IRIS_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file; a missing or broken file yields the defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Write the example config if no file exists yet
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }

    /// Key from the `[api_keys]` table for a provider
    pub fn configured_api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Groq => self.api_keys.groq.as_deref(),
            Provider::OpenAI => self.api_keys.openai.as_deref(),
            Provider::OpenRouter => self.api_keys.openrouter.as_deref(),
            Provider::Custom => self.api_keys.custom.as_deref(),
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# iris configuration file
# Place at ~/.config/iris/config.toml (Linux), ~/Library/Application Support/iris/config.toml (Mac)
# or %APPDATA%\iris\config.toml (Windows). IRIS_CONFIG_PATH overrides the location.

# Vision model to use
model = "llama-3.2-90b-vision-preview"

# Provider (groq, openai, openrouter, custom)
provider = "groq"

# API base URL; defaults to the provider's endpoint. Required for "custom".
# base_url = "http://localhost:8080/v1"

# Seconds to wait for an answer
timeout_secs = 60

# Sampling settings
temperature = 0.7
max_tokens = 1024

# Whether to use TUI mode by default (true by default)
# Set to false for simple stdin/stdout mode
tui = true

# Color theme (dark, light)
theme = "dark"

# Upload normalization (defaults shown; limits can only be lowered)
[image]
# max_dimension = 800
# jpeg_quality = 85
# max_bytes = 4194304

# API keys (optional - can also use environment variables such as GROQ_API_KEY)
[api_keys]
# groq = "gsk_..."
# openai = "sk-..."
# openrouter = "sk-or-..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_ai::providers::get_api_key;

    #[test]
    fn test_example_config_parses() {
        let cfg = Config::parse(example_config()).unwrap();
        assert_eq!(cfg.model.as_deref(), Some("llama-3.2-90b-vision-preview"));
        assert_eq!(cfg.provider.as_deref(), Some("groq"));
        assert_eq!(cfg.timeout_secs, Some(60));
        assert_eq!(cfg.max_tokens, Some(1024));
        assert_eq!(cfg.tui, Some(true));
        assert!(cfg.api_keys.groq.is_none());
    }

    #[test]
    fn test_partial_config_defaults() {
        let cfg = Config::parse("tui = false\n").unwrap();
        assert_eq!(cfg.tui, Some(false));
        assert!(cfg.model.is_none());
        assert!(cfg.base_url.is_none());
    }

    #[test]
    fn test_configured_key_wins() {
        let cfg = Config::parse("[api_keys]\ngroq = \"gsk-from-file\"\ncustom = \"local\"\n").unwrap();
        let key = get_api_key(cfg.configured_api_key(Provider::Groq), Provider::Groq).unwrap();
        assert_eq!(key, "gsk-from-file");
        assert_eq!(cfg.configured_api_key(Provider::Custom), Some("local"));
        assert!(cfg.configured_api_key(Provider::OpenAI).is_none());
    }

    #[test]
    fn test_blank_key_is_missing() {
        let cfg = Config::parse("[api_keys]\ncustom = \"  \"\n").unwrap();
        assert!(get_api_key(cfg.configured_api_key(Provider::Custom), Provider::Custom).is_err());
    }

    #[test]
    fn test_image_settings_override() {
        let cfg = Config::parse("[image]\nmax_dimension = 512\njpeg_quality = 120\n").unwrap();
        let options = cfg.image.apply(NormalizeOptions::default());
        assert_eq!(options.max_dimension, 512);
        assert_eq!(options.jpeg_quality, 100);
        assert_eq!(options.max_bytes, NormalizeOptions::default().max_bytes);
    }

    #[test]
    fn test_image_settings_cannot_loosen_limits() {
        let defaults = NormalizeOptions::default();
        let cfg = Config::parse("[image]\nmax_dimension = 4000\nmax_bytes = 67108864\n").unwrap();
        let options = cfg.image.apply(defaults);
        assert_eq!(options.max_dimension, 800);
        assert_eq!(options.max_bytes, 4 * 1024 * 1024);

        let cfg = Config::parse("[image]\nmax_dimension = 0\n").unwrap();
        assert_eq!(cfg.image.apply(defaults).max_dimension, 1);
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(Config::parse("timeout_secs = \"soon\"").is_err());
    }
}
