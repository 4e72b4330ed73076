//! Provider credential pools and model selection.
//!
//! Keys come from numbered environment variables so operators can grow
//! the pool without a deploy: `GEMINI_API_KEY` plus `GEMINI_API_KEY_2`,
//! `GEMINI_API_KEY_3`, ... are collected in order. Pool order is
//! rotation order.

use serde::Serialize;
use tracing::info;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_TTS_VOICE: &str = "Aoede";

/// Provider configuration: ordered key pools and model names.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Ordered Gemini credential pool (text, TTS and vision calls).
    pub gemini_keys: Vec<String>,
    pub text_model: String,
    pub tts_model: String,
    pub tts_voice: String,
}

/// Public view of the configuration; never exposes key material.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    #[serde(rename = "geminiKeysConfigured")]
    pub gemini_keys_configured: usize,
    #[serde(rename = "textModel")]
    pub text_model: String,
    #[serde(rename = "ttsModel")]
    pub tts_model: String,
}

impl ProviderConfig {
    /// Load pools and models from the environment.
    pub fn from_env() -> Self {
        let gemini_keys = collect_keys("GEMINI_API_KEY");
        info!("loaded {} Gemini credential(s)", gemini_keys.len());

        Self {
            gemini_keys,
            text_model: env_or("GEMINI_TEXT_MODEL", DEFAULT_TEXT_MODEL),
            tts_model: env_or("GEMINI_TTS_MODEL", DEFAULT_TTS_MODEL),
            tts_voice: env_or("GEMINI_TTS_VOICE", DEFAULT_TTS_VOICE),
        }
    }

    pub fn to_status(&self) -> ProviderStatus {
        ProviderStatus {
            gemini_keys_configured: self.gemini_keys.len(),
            text_model: self.text_model.clone(),
            tts_model: self.tts_model.clone(),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Collect `{prefix}`, `{prefix}_2`, `{prefix}_3`, ... until the first gap.
fn collect_keys(prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Ok(key) = std::env::var(prefix) {
        if !key.trim().is_empty() {
            keys.push(key);
        }
    }
    for n in 2.. {
        match std::env::var(format!("{}_{}", prefix, n)) {
            Ok(key) if !key.trim().is_empty() => keys.push(key),
            _ => break,
        }
    }
    keys
}
