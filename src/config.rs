// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};
use tracing::warn;

pub const DEFAULT_EDINET_BASE_URL: &str = "https://api.edinet-fsa.go.jp/api/v2";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";
pub const DEFAULT_LLM_FALLBACK_MODEL: &str = "gpt-4-turbo";

/// Runtime configuration, passed explicitly into the scanner, the
/// dispatcher and the analysis tools.
#[derive(Debug, Clone)]
pub struct Config {
    pub edinet_api_key: Option<String>,
    pub edinet_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_fallback_model: String,
    pub limits: Limits,
}

/// Numeric knobs for scanning and prompt construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub days_back: u32,
    pub max_documents: usize,
    pub max_summary_words: usize,
    pub max_company_description_words: usize,
    pub max_impact_rationale_words: usize,
    /// Characters kept from each text block in the one-line prompt.
    pub content_preview_chars: usize,
    pub max_text_blocks_for_oneliner: usize,
    /// Total text-block budget for the executive-summary prompt.
    pub prompt_char_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            days_back: 3,
            max_documents: 5,
            max_summary_words: 30,
            max_company_description_words: 20,
            max_impact_rationale_words: 30,
            content_preview_chars: 500,
            max_text_blocks_for_oneliner: 3,
            prompt_char_limit: 8000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            edinet_api_key: None,
            edinet_base_url: DEFAULT_EDINET_BASE_URL.to_string(),
            llm_api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_fallback_model: DEFAULT_LLM_FALLBACK_MODEL.to_string(),
            limits: Limits::default(),
        }
    }
}

/// What a YAML config file may set. Every field is optional; only the
/// ones present are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverlay {
    pub edinet_api_key: Option<String>,
    pub edinet_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub llm_fallback_model: Option<String>,
    /// Partial tables keep defaults for the keys they omit.
    pub limits: Option<Limits>,
}

impl ConfigOverlay {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}

impl Config {
    /// Defaults, then the process environment, then the YAML file at
    /// `path` if one is given. Values present in the file win.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.fill_from_env(|key| env::var(key).ok());
        if let Some(p) = path {
            cfg.apply(ConfigOverlay::from_yaml_file(p)?);
        }
        cfg.warn_missing();
        Ok(cfg)
    }

    pub fn apply(&mut self, overlay: ConfigOverlay) {
        if overlay.edinet_api_key.is_some() {
            self.edinet_api_key = overlay.edinet_api_key;
        }
        if overlay.llm_api_key.is_some() {
            self.llm_api_key = overlay.llm_api_key;
        }
        if let Some(v) = overlay.edinet_base_url {
            self.edinet_base_url = v;
        }
        if let Some(v) = overlay.llm_base_url {
            self.llm_base_url = v;
        }
        if let Some(v) = overlay.llm_model {
            self.llm_model = v;
        }
        if let Some(v) = overlay.llm_fallback_model {
            self.llm_fallback_model = v;
        }
        if let Some(limits) = overlay.limits {
            self.limits = limits;
        }
    }

    /// Overwrite fields with whatever the environment sets.
    fn fill_from_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("EDINET_API_KEY") {
            self.edinet_api_key = Some(v);
        }
        if let Some(v) = non_empty("LLM_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.llm_api_key = Some(v);
        }
        if let Some(v) = non_empty("LLM_BASE_URL") {
            self.llm_base_url = v;
        }
        if let Some(v) = non_empty("LLM_MODEL") {
            self.llm_model = v;
        }
        if let Some(v) = non_empty("LLM_FALLBACK_MODEL") {
            self.llm_fallback_model = v;
        }
    }

    fn warn_missing(&self) {
        if self.edinet_api_key.is_none() {
            warn!("EDINET_API_KEY not set; registry queries will fail");
        }
        if self.llm_api_key.is_none() {
            warn!("LLM_API_KEY (or OPENAI_API_KEY) not set; LLM analysis disabled");
        }
    }
}
