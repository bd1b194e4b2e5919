//! Query Engine
//!
//! Ties together query parsing, the per-attribute fuzzy indices and the
//! memo cache. Attribute clauses run against their own index, free text
//! against the general index, and the result sets are intersected by the
//! caller-supplied identity.

use super::fields::AttributeKeys;
use super::index::{FuzzyIndex, Hit};
use super::parser::{AttributeQuery, ParsedQuery, QueryParser};
use crate::cache::{CacheStats, QueryCache};
use crate::config::{EngineConfig, IntersectionScore};
use crate::error::SearchError;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;
use tracing::{debug, info};

/// A matched record, score in `[0, 1]` with 0 a perfect match
#[derive(Debug, Serialize)]
pub struct SearchResult<'a, T> {
    pub item: &'a T,
    pub score: f64,
}

impl<T> Clone for SearchResult<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SearchResult<'_, T> {}

/// Everything needed to construct a [`QueryEngine`]
pub struct EngineOptions<T, K> {
    pub collection: Vec<T>,
    pub identity: Box<dyn Fn(&T) -> K>,
    pub keys: AttributeKeys,
    pub config: EngineConfig,
}

impl<T, K> EngineOptions<T, K> {
    pub fn new(
        collection: Vec<T>,
        identity: impl Fn(&T) -> K + 'static,
        keys: AttributeKeys,
    ) -> Self {
        Self {
            collection,
            identity: Box::new(identity),
            keys,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

/// Search engine over one immutable record collection.
///
/// The memo cache lives in a `RefCell`, so an engine is confined to one
/// thread; rebuild it when the collection changes.
pub struct QueryEngine<T, K> {
    collection: Vec<T>,
    identities: Vec<K>,
    keys: AttributeKeys,
    indices: HashMap<String, FuzzyIndex>,
    general: FuzzyIndex,
    config: EngineConfig,
    cache: RefCell<QueryCache<Rc<[Hit]>>>,
}

impl<T, K> QueryEngine<T, K>
where
    T: Serialize,
    K: Eq + Hash,
{
    /// Build one index per attribute plus the general index.
    ///
    /// Fails without returning a partial engine if any record holds a value
    /// the indexer cannot coerce.
    pub fn new(options: EngineOptions<T, K>) -> Result<Self, SearchError> {
        let EngineOptions {
            collection,
            identity,
            keys,
            config,
        } = options;

        let records = collection
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?;

        let mut indices = HashMap::with_capacity(keys.len());
        for (name, path) in keys.iter() {
            let index =
                FuzzyIndex::build(&records, vec![path.clone()], config.min_match_char_length)?;
            indices.insert(name.to_string(), index);
        }
        let general =
            FuzzyIndex::build(&records, keys.union_paths(), config.min_match_char_length)?;

        let identities = collection.iter().map(|record| identity(record)).collect();

        info!(
            "Built {} attribute indices and a general index over {} fields for {} records",
            indices.len(),
            general.paths().len(),
            collection.len()
        );

        Ok(Self {
            collection,
            identities,
            keys,
            indices,
            general,
            cache: RefCell::new(QueryCache::new(config.cache_capacity)),
            config,
        })
    }
}

impl<T, K> QueryEngine<T, K>
where
    K: Eq + Hash,
{
    /// Search with a raw query string, memoized by the exact string
    pub fn search(&self, query: &str) -> Vec<SearchResult<'_, T>> {
        let cached = self.cache.borrow_mut().get(query);
        let hits = match cached {
            Some(hits) => hits,
            None => {
                let parsed = self.parse_query_string(query);
                let hits: Rc<[Hit]> = self.execute(&parsed).into();
                self.cache.borrow_mut().insert(query, Rc::clone(&hits));
                hits
            }
        };
        self.resolve(&hits)
    }

    /// Search with an already parsed query; bypasses the memo cache
    pub fn search_parsed(&self, parsed: &ParsedQuery) -> Vec<SearchResult<'_, T>> {
        let hits = self.execute(parsed);
        self.resolve(&hits)
    }

    fn resolve(&self, hits: &[Hit]) -> Vec<SearchResult<'_, T>> {
        hits.iter()
            .map(|hit| SearchResult {
                item: &self.collection[hit.index],
                score: hit.score,
            })
            .collect()
    }

    fn execute(&self, parsed: &ParsedQuery) -> Vec<Hit> {
        let mut running: Option<Vec<Hit>> = None;

        for clause in &parsed.attribute_queries {
            let Some(index) = self.indices.get(&clause.attribute) else {
                debug!("Skipping clause for unindexed attribute {}", clause.attribute);
                continue;
            };
            let hits = index.search(&clause.value);
            running = Some(match running {
                None => hits,
                Some(current) => self.intersect(current, hits),
            });
        }

        if !parsed.query.is_empty() {
            let hits = self.general.search(&parsed.query);
            running = Some(match running {
                None => hits,
                Some(current) => self.intersect(current, hits),
            });
        }

        let hits = running.unwrap_or_default();
        let found = hits.len();
        let hits = self.finalize(hits);

        debug!(
            "Query {:?} with {} clauses matched {} records, {} after filtering",
            parsed.query,
            parsed.attribute_queries.len(),
            found,
            hits.len()
        );
        hits
    }

    /// Keep incoming hits whose identity is also in the running set, in
    /// incoming order. The surviving score follows the configured policy.
    fn intersect(&self, running: Vec<Hit>, incoming: Vec<Hit>) -> Vec<Hit> {
        let mut present: HashMap<&K, f64> = HashMap::with_capacity(running.len());
        for hit in &running {
            present
                .entry(&self.identities[hit.index])
                .or_insert(hit.score);
        }

        let policy = self.config.intersection;
        let mut merged: Vec<Hit> = incoming
            .into_iter()
            .filter_map(|hit| {
                present
                    .get(&self.identities[hit.index])
                    .map(|&previous| Hit {
                        index: hit.index,
                        score: policy.merge(previous, hit.score),
                    })
            })
            .collect();

        if policy == IntersectionScore::Min {
            merged.sort_by(|a, b| a.score.total_cmp(&b.score));
        }
        merged
    }

    /// Drop hits above the maximum score, then de-dupe by identity
    fn finalize(&self, hits: Vec<Hit>) -> Vec<Hit> {
        let mut seen: HashSet<&K> = HashSet::with_capacity(hits.len());
        hits.into_iter()
            .filter(|hit| hit.score <= self.config.max_score)
            .filter(|hit| seen.insert(&self.identities[hit.index]))
            .collect()
    }

    pub fn parse_query_string(&self, query: &str) -> ParsedQuery {
        QueryParser::new(&self.keys).parse(query)
    }

    pub fn build_query_string(&self, parsed: &ParsedQuery) -> Result<String, SearchError> {
        QueryParser::new(&self.keys).build(parsed)
    }

    /// Add a clause to a query string unless an identical one is present
    pub fn with_attribute_query(
        &self,
        query: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, SearchError> {
        if !self.keys.contains(attribute) {
            return Err(SearchError::UnknownAttribute(attribute.to_string()));
        }
        let mut parsed = self.parse_query_string(query);
        let clause = AttributeQuery::new(attribute, value.trim());
        if !parsed.attribute_queries.contains(&clause) {
            parsed.attribute_queries.push(clause);
        }
        self.build_query_string(&parsed)
    }

    /// Remove every clause identical to `attribute:value` from a query string
    pub fn without_attribute_query(
        &self,
        query: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, SearchError> {
        if !self.keys.contains(attribute) {
            return Err(SearchError::UnknownAttribute(attribute.to_string()));
        }
        let mut parsed = self.parse_query_string(query);
        let clause = AttributeQuery::new(attribute, value.trim());
        parsed.attribute_queries.retain(|existing| *existing != clause);
        self.build_query_string(&parsed)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.keys.names()
    }

    pub fn collection(&self) -> &[T] {
        &self.collection
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }
}
