//! Runtime configuration.

use std::time::Duration;
use tracing::warn;

use crate::providers::CompletionConfig;

/// Settings for the enrichment pipeline.
///
/// Temperature and seed are fixed so identical deals produce identical
/// replies, which is what makes the audit cache sound.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model identifier passed to the provider.
    pub model: String,

    /// Completion token budget.
    pub max_tokens: u32,

    /// Sampling temperature. Kept at 0.0.
    pub temperature: f32,

    /// Fixed sampling seed.
    pub seed: u64,

    /// Upstream request timeout.
    pub timeout: Duration,

    /// Maximum number of cached audit replies.
    pub cache_capacity: u64,

    /// How long a cached reply stays valid.
    pub cache_ttl: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            seed: 42,
            timeout: Duration::from_secs(60),
            cache_capacity: 1_000,
            cache_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl RuntimeConfig {
    /// Defaults with environment overrides applied.
    ///
    /// `DEALSCOPE_MODEL` replaces the model name; `DEALSCOPE_TIMEOUT`
    /// takes a humantime duration (e.g. "90s", "2m"). Unparseable
    /// values are logged and ignored rather than failing startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("DEALSCOPE_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(raw) = std::env::var("DEALSCOPE_TIMEOUT") {
            match humantime::parse_duration(&raw) {
                Ok(timeout) => config.timeout = timeout,
                Err(err) => warn!(%raw, %err, "ignoring invalid DEALSCOPE_TIMEOUT"),
            }
        }
        config
    }

    /// Per-request completion settings derived from this config.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            seed: self.seed,
            json_mode: true,
            timeout: self.timeout,
        }
    }
}
