//! Engine tuning and the optional JSON settings file

use crate::search::fields::AttributeKeys;
use crate::search::fuzzy::DEFAULT_MIN_MATCH_CHAR_LENGTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Environment variable naming the settings file, read by the CLI
pub const CONFIG_ENV: &str = "STICKERDEX_CONFIG";

/// Results scoring above this are dropped
pub const DEFAULT_MAX_SCORE: f64 = 0.6;

/// Which score survives when two sub-searches are intersected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntersectionScore {
    /// Score of the sub-search being intersected in
    #[default]
    Last,
    /// Lower of the two scores
    Min,
}

impl IntersectionScore {
    pub fn merge(self, running: f64, incoming: f64) -> f64 {
        match self {
            IntersectionScore::Last => incoming,
            IntersectionScore::Min => running.min(incoming),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_score: f64,
    pub min_match_char_length: usize,
    /// `None` memoizes every distinct query for the engine's lifetime
    pub cache_capacity: Option<usize>,
    pub intersection: IntersectionScore,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_score: DEFAULT_MAX_SCORE,
            min_match_char_length: DEFAULT_MIN_MATCH_CHAR_LENGTH,
            cache_capacity: None,
            intersection: IntersectionScore::default(),
        }
    }
}

/// Contents of the settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attribute keys; the sticker pack defaults apply when absent
    pub keys: Option<AttributeKeys>,
    pub engine: EngineConfig,
}

/// Load settings, falling back to defaults when no file is configured.
///
/// The CLI resolves [`CONFIG_ENV`] into `path`; this function does not
/// consult the environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let settings: Settings = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    debug!(
        "Loaded settings from {} ({} custom keys)",
        path.display(),
        settings.keys.as_ref().map_or(0, AttributeKeys::len)
    );
    Ok(settings)
}
