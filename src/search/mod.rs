//! Sticker pack query engine
//!
//! Per-attribute fuzzy indices, the `attribute:value` query grammar and
//! identity-based intersection of sub-search results.

pub mod engine;
pub mod fields;
pub mod fuzzy;
pub mod index;
pub mod parser;


pub use engine::{EngineOptions, QueryEngine, SearchResult};
pub use fields::{AttributeKeys, FieldPath, LeafValue};
pub use fuzzy::FuzzyMatcher;
pub use parser::{AttributeQuery, ParsedQuery, QueryParser, Token};
