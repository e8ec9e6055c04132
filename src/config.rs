//! Settings: optional `suminfo.toml` next to the binary, overridden by
//! `SUMINFO_*` environment variables (nested keys use `__`, e.g.
//! `SUMINFO_BACKEND__API_KEY`).

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::chunk::DEFAULT_SUB_BATCH_SIZE;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
                .to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 120,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sub_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sub_batch_size: DEFAULT_SUB_BATCH_SIZE,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("suminfo").required(false))
            .add_source(config::Environment::with_prefix("SUMINFO").separator("__"))
            .build()
            .context("failed to read settings")?;
        settings.try_deserialize().context("invalid settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_without_any_source() {
        let cfg = AppConfig::default();
        assert!(cfg.backend.api_key.is_empty());
        assert_eq!(cfg.pipeline.sub_batch_size, DEFAULT_SUB_BATCH_SIZE);
        assert!(cfg.backend.api_url.starts_with("https://"));
    }
}
