//! Sticker pack directory records
//!
//! A directory entry pairs the contributor-supplied metadata with fields
//! copied from the pack's decrypted manifest.

use crate::search::fields::AttributeKeys;
use serde::{Deserialize, Serialize};

/// Sticker pack entry as listed in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerPack {
    pub meta: PackMeta,
    pub manifest: Manifest,
}

/// Contributor metadata. Flags are absent on most packs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackMeta {
    pub id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editorschoice: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tgstickers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlisted: Option<bool>,
}

/// Fields taken from the pack manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<Sticker>,
    #[serde(default)]
    pub stickers: Vec<Sticker>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub id: u32,
    #[serde(default)]
    pub emoji: String,
}

impl StickerPack {
    /// Identity used to de-dupe and intersect search results
    pub fn identity(&self) -> String {
        self.meta.id.clone()
    }

    /// Link that opens the pack in the messaging app
    pub fn install_url(&self) -> String {
        format!(
            "https://signal.art/addstickers/#pack_id={}&pack_key={}",
            self.meta.id, self.meta.key
        )
    }

    pub fn is_unlisted(&self) -> bool {
        self.meta.unlisted.unwrap_or(false)
    }

    /// Markdown summary used by the CLI
    pub fn to_markdown(&self, score: f64) -> String {
        let mut markdown = format!("## {}", self.manifest.title);
        if let Some(author) = &self.manifest.author {
            markdown.push_str(&format!(" by {}", author));
        }
        markdown.push_str(&format!("\n\n**Score:** {:.3}\n", score));

        if !self.meta.tags.is_empty() {
            markdown.push_str(&format!("**Tags:** {}\n", self.meta.tags.join(", ")));
        }

        let flags: Vec<&str> = [
            ("nsfw", self.meta.nsfw),
            ("original", self.meta.original),
            ("animated", self.meta.animated),
            ("editor's choice", self.meta.editorschoice),
        ]
        .into_iter()
        .filter(|(_, flag)| flag.unwrap_or(false))
        .map(|(name, _)| name)
        .collect();
        if !flags.is_empty() {
            markdown.push_str(&format!("**Flags:** {}\n", flags.join(", ")));
        }

        markdown.push_str(&format!("**Stickers:** {}\n", self.manifest.stickers.len()));
        markdown.push_str(&format!("**Install:** {}\n", self.install_url()));
        markdown
    }
}

/// Attributes the directory search box understands
pub fn default_keys() -> AttributeKeys {
    AttributeKeys::new()
        .with("title", "manifest.title")
        .with("author", "manifest.author")
        .with("tag", "meta.tags")
        .with("source", "meta.source")
        .with("emoji", "manifest.stickers.emoji")
        .with("nsfw", "meta.nsfw")
        .with("original", "meta.original")
        .with("animated", "meta.animated")
        .with("editorschoice", "meta.editorschoice")
        .with("tgstickers", "meta.tgstickers")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK_JSON: &str = r#"{
        "meta": {
            "id": "0123abcd",
            "key": "deadbeef",
            "tags": ["cat", "cute"],
            "original": true
        },
        "manifest": {
            "title": "Cat Crew",
            "author": "Mia",
            "cover": {"id": 0, "emoji": "🐱"},
            "stickers": [{"id": 0, "emoji": "🐱"}, {"id": 1, "emoji": "😹"}]
        }
    }"#;

    #[test]
    fn test_deserialize_pack() {
        let pack: StickerPack = serde_json::from_str(PACK_JSON).unwrap();
        assert_eq!(pack.identity(), "0123abcd");
        assert_eq!(pack.manifest.stickers.len(), 2);
        assert_eq!(pack.meta.original, Some(true));
        assert_eq!(pack.meta.nsfw, None);
        assert!(!pack.is_unlisted());
    }

    #[test]
    fn test_absent_flags_are_not_serialized() {
        let pack: StickerPack = serde_json::from_str(PACK_JSON).unwrap();
        let value = serde_json::to_value(&pack).unwrap();
        assert!(value["meta"].get("nsfw").is_none());
        assert_eq!(value["meta"]["original"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_install_url() {
        let pack: StickerPack = serde_json::from_str(PACK_JSON).unwrap();
        assert_eq!(
            pack.install_url(),
            "https://signal.art/addstickers/#pack_id=0123abcd&pack_key=deadbeef"
        );
    }

    #[test]
    fn test_markdown_summary() {
        let pack: StickerPack = serde_json::from_str(PACK_JSON).unwrap();
        let markdown = pack.to_markdown(0.25);
        assert!(markdown.starts_with("## Cat Crew by Mia"));
        assert!(markdown.contains("**Score:** 0.250"));
        assert!(markdown.contains("**Tags:** cat, cute"));
        assert!(markdown.contains("**Flags:** original"));
        assert!(markdown.contains("**Stickers:** 2"));
    }

    #[test]
    fn test_default_keys() {
        let keys = default_keys();
        assert_eq!(keys.len(), 10);
        assert_eq!(keys.get("tag").unwrap().to_string(), "meta.tags");
        assert_eq!(
            keys.get("emoji").unwrap().segments(),
            &["manifest", "stickers", "emoji"]
        );
    }
}
