//! Fuzzy Matching using nucleo-matcher
//!
//! Scores are normalized to `[0, 1]` where 0 is a perfect match. The raw
//! Smith-Waterman score is compared to the score the needle earns against
//! itself, so the position of a hit inside a long field does not matter.

use nucleo_matcher::{Config, Matcher, Utf32String};
use unicode_normalization::UnicodeNormalization;

/// Default minimum run of consecutive matched characters
pub const DEFAULT_MIN_MATCH_CHAR_LENGTH: usize = 2;

/// Needle prepared once and matched against many haystacks
pub struct Needle {
    text: Utf32String,
    /// Raw score of the needle matched against itself
    perfect: u16,
}

impl Needle {
    pub fn is_empty(&self) -> bool {
        self.perfect == 0
    }
}

/// Case-insensitive fuzzy matcher
pub struct FuzzyMatcher {
    matcher: Matcher,
    min_match_char_length: usize,
    indices: Vec<u32>,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_MATCH_CHAR_LENGTH)
    }
}

impl FuzzyMatcher {
    pub fn new(min_match_char_length: usize) -> Self {
        let mut config = Config::DEFAULT;
        config.ignore_case = true;
        // Needles are NFC-normalized and lowercased by us; nucleo's own
        // diacritic folding would only apply to the haystack side.
        config.normalize = false;
        config.prefer_prefix = false;

        Self {
            matcher: Matcher::new(config),
            min_match_char_length: min_match_char_length.max(1),
            indices: Vec::new(),
        }
    }

    /// Normalize a needle and compute its self-match score
    pub fn prepare(&mut self, needle: &str) -> Needle {
        let normalized = normalize_for_matching(needle).to_lowercase();
        // Removed clauses leave whitespace runs behind; the matcher would
        // otherwise demand every one of those spaces in the haystack.
        let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        let text = Utf32String::from(collapsed.as_str());
        let perfect = if collapsed.is_empty() {
            0
        } else {
            self.matcher
                .fuzzy_match(text.slice(..), text.slice(..))
                .unwrap_or(0)
        };
        Needle { text, perfect }
    }

    /// Score a haystack against a prepared needle.
    ///
    /// Returns `None` when the needle is not a subsequence of the haystack or
    /// when no run of matched characters reaches the minimum fragment length.
    /// Runs are measured in UTF-16 code units, so a lone emoji counts as two.
    pub fn score(&mut self, haystack: &str, needle: &Needle) -> Option<f64> {
        if needle.is_empty() {
            return None;
        }

        let haystack = Utf32String::from(normalize_for_matching(haystack).as_str());
        self.indices.clear();
        let raw = self.matcher.fuzzy_indices(
            haystack.slice(..),
            needle.text.slice(..),
            &mut self.indices,
        )?;

        self.indices.sort_unstable();
        self.indices.dedup();
        let haystack_chars = haystack.slice(..);
        let run = longest_run(&self.indices, |i| haystack_chars.get(i).len_utf16());
        if run < self.min_match_char_length {
            return None;
        }

        let ratio = f64::from(raw) / f64::from(needle.perfect);
        Some((1.0 - ratio.min(1.0)).max(0.0))
    }

    /// Convenience for one-off comparisons
    pub fn fuzzy_match(&mut self, haystack: &str, needle: &str) -> Option<f64> {
        let needle = self.prepare(needle);
        self.score(haystack, &needle)
    }
}

/// Unicode NFC normalization (canonical composition)
fn normalize_for_matching(text: &str) -> String {
    text.nfc().collect::<String>()
}

/// Width of the widest run of consecutive positions
fn longest_run(sorted: &[u32], width: impl Fn(u32) -> usize) -> usize {
    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<u32> = None;
    for &position in sorted {
        current = match previous {
            Some(p) if p + 1 == position => current + width(position),
            _ => width(position),
        };
        best = best.max(current);
        previous = Some(position);
    }
    best
}
