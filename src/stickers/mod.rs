//! Sticker pack directory data and engine setup

pub mod records;

pub use records::{default_keys, Manifest, PackMeta, Sticker, StickerPack};

use crate::config::Settings;
use crate::error::SearchError;
use crate::search::{EngineOptions, QueryEngine};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Engine over sticker packs, keyed by pack id
pub type PackEngine = QueryEngine<StickerPack, String>;

/// Load a JSON array of directory entries
pub fn load_packs(path: &Path) -> Result<Vec<StickerPack>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pack list {}", path.display()))?;
    let packs = parse_packs(&data)
        .with_context(|| format!("Failed to parse pack list {}", path.display()))?;
    info!("Loaded {} sticker packs from {}", packs.len(), path.display());
    Ok(packs)
}

pub fn parse_packs(data: &str) -> Result<Vec<StickerPack>> {
    let packs: Vec<StickerPack> = serde_json::from_str(data)?;
    Ok(packs)
}

/// Build the directory engine. Unlisted packs are left out of the index.
pub fn build_engine(packs: Vec<StickerPack>, settings: &Settings) -> Result<PackEngine, SearchError> {
    let total = packs.len();
    let listed: Vec<StickerPack> = packs.into_iter().filter(|p| !p.is_unlisted()).collect();
    if listed.len() < total {
        debug!("Skipping {} unlisted packs", total - listed.len());
    }

    let keys = settings.keys.clone().unwrap_or_else(default_keys);
    let options = EngineOptions::new(listed, StickerPack::identity, keys)
        .with_config(settings.engine.clone());
    QueryEngine::new(options)
}
