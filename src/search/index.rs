//! Per-attribute fuzzy indices
//!
//! An index stores the coerced texts of every record for its field paths.
//! It is built once from the serialized collection and never changes.

use super::fields::{extract_texts, FieldPath};
use super::fuzzy::FuzzyMatcher;
use crate::error::SearchError;
use serde_json::Value;

/// Position of a record in the collection with its match score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub score: f64,
}

pub struct FuzzyIndex {
    paths: Vec<FieldPath>,
    /// Matcher texts per record, across all paths
    docs: Vec<Vec<String>>,
    min_match_char_length: usize,
}

impl FuzzyIndex {
    pub fn build(
        records: &[Value],
        paths: Vec<FieldPath>,
        min_match_char_length: usize,
    ) -> Result<Self, SearchError> {
        let mut docs = Vec::with_capacity(records.len());
        for record in records {
            let mut texts = Vec::new();
            for path in &paths {
                texts.extend(extract_texts(record, path)?);
            }
            docs.push(texts);
        }

        Ok(Self {
            paths,
            docs,
            min_match_char_length,
        })
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Fuzzy search every record, best score first.
    ///
    /// A record's score is the product of the scores of each of its matching
    /// texts, so several partial hits rank a record above a single one.
    pub fn search(&self, query: &str) -> Vec<Hit> {
        let mut matcher = FuzzyMatcher::new(self.min_match_char_length);
        let needle = matcher.prepare(query);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<Hit> = self
            .docs
            .iter()
            .enumerate()
            .filter_map(|(index, texts)| {
                let mut combined: Option<f64> = None;
                for text in texts {
                    if let Some(score) = matcher.score(text, &needle) {
                        combined = Some(combined.unwrap_or(1.0) * score);
                    }
                }
                combined.map(|score| Hit { index, score })
            })
            .collect();

        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits
    }
}
