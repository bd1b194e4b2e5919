//! stickerdex: fuzzy query engine for community sticker pack directories
//!
//! The engine indexes each configured attribute of a record collection,
//! parses search box input such as `cats tag:cute author:"Jane Doe"` and
//! intersects the per-attribute and free-text results by record identity.
//!
//! ```no_run
//! use stickerdex::config::Settings;
//! use stickerdex::stickers::{build_engine, load_packs};
//!
//! let packs = load_packs("packs.json".as_ref())?;
//! let engine = build_engine(packs, &Settings::default())?;
//! for result in engine.search("cats tag:cute") {
//!     println!("{:.3} {}", result.score, result.item.manifest.title);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod search;
pub mod stickers;

pub use config::{EngineConfig, IntersectionScore, Settings};
pub use error::SearchError;
pub use search::{
    AttributeKeys, AttributeQuery, EngineOptions, FieldPath, ParsedQuery, QueryEngine,
    SearchResult,
};
