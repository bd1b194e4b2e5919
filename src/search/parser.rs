//! Query Parser & Serializer
//!
//! Splits a search box string into attribute clauses (`tag:cute`,
//! `author:"Jane Doe"`) and free text, and renders parsed queries back into
//! strings. Parsing never fails: a clause naming an unregistered attribute
//! stays in the free text.

use super::fields::AttributeKeys;
use crate::error::SearchError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Range;

/// One `attribute:value` clause of a parsed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeQuery {
    pub attribute: String,
    pub value: String,
}

impl AttributeQuery {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

// Serialized as a single-key map, `{"tag": "cute"}`
impl Serialize for AttributeQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.attribute, &self.value)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ClauseVisitor;

        impl<'de> Visitor<'de> for ClauseVisitor {
            type Value = AttributeQuery;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map with exactly one attribute name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let (attribute, value) = map
                    .next_entry::<String, String>()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                if map.next_key::<String>()?.is_some() {
                    return Err(serde::de::Error::invalid_length(2, &self));
                }
                Ok(AttributeQuery { attribute, value })
            }
        }

        deserializer.deserialize_map(ClauseVisitor)
    }
}

/// Parsed search box contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Remaining free text, trimmed
    #[serde(default)]
    pub query: String,
    /// Registered attribute clauses in input order
    #[serde(default)]
    pub attribute_queries: Vec<AttributeQuery>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.attribute_queries.is_empty()
    }
}

/// Lexical token produced by [`QueryParser::tokenize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `attribute:value`
    Clause {
        attribute: &'a str,
        value: &'a str,
        span: Range<usize>,
    },
    /// `attribute:"value with spaces"`
    QuotedClause {
        attribute: &'a str,
        value: &'a str,
        span: Range<usize>,
    },
    /// Anything between clauses, whitespace included
    Text(&'a str),
}

impl Token<'_> {
    /// Byte range of a clause within the input
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Token::Clause { span, .. } | Token::QuotedClause { span, .. } => Some(span.clone()),
            Token::Text(_) => None,
        }
    }
}

/// Attribute names and unquoted values are runs of these characters
fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && c != ':' && c != '"'
}

fn run_end(input: &str, start: usize, accept: impl Fn(char) -> bool) -> usize {
    input[start..]
        .char_indices()
        .find(|&(_, c)| !accept(c))
        .map_or(input.len(), |(offset, _)| start + offset)
}

/// Query parser bound to the set of registered attributes
pub struct QueryParser<'k> {
    keys: &'k AttributeKeys,
}

impl<'k> QueryParser<'k> {
    pub fn new(keys: &'k AttributeKeys) -> Self {
        Self { keys }
    }

    /// Single left-to-right scan into clause and text tokens.
    ///
    /// A clause is an attribute run followed by `:` and either a quoted body
    /// (no `"` or `:` inside) or an unquoted run. Spans never overlap and the
    /// tokens cover the whole input.
    pub fn tokenize(input: &str) -> Vec<Token<'_>> {
        let mut tokens = Vec::new();
        let mut text_start = 0;
        let mut pos = 0;

        while let Some(c) = input[pos..].chars().next() {
            if !is_word_char(c) {
                pos += c.len_utf8();
                continue;
            }

            let name_end = run_end(input, pos, is_word_char);
            let clause = Self::clause_at(input, pos, name_end);

            match clause.as_ref().and_then(Token::span) {
                Some(span) => {
                    if text_start < span.start {
                        tokens.push(Token::Text(&input[text_start..span.start]));
                    }
                    text_start = span.end;
                    pos = span.end;
                    tokens.extend(clause);
                }
                None => pos = name_end,
            }
        }

        if text_start < input.len() {
            tokens.push(Token::Text(&input[text_start..]));
        }
        tokens
    }

    fn clause_at(input: &str, name_start: usize, name_end: usize) -> Option<Token<'_>> {
        let rest = &input[name_end..];
        if !rest.starts_with(':') {
            return None;
        }
        let attribute = &input[name_start..name_end];
        let value_start = name_end + 1;

        if input[value_start..].starts_with('"') {
            let body_start = value_start + 1;
            let body_end = run_end(input, body_start, |c| c != '"' && c != ':');
            if input[body_end..].starts_with('"') {
                return Some(Token::QuotedClause {
                    attribute,
                    value: &input[body_start..body_end],
                    span: name_start..body_end + 1,
                });
            }
            return None;
        }

        let value_end = run_end(input, value_start, is_word_char);
        if value_end == value_start {
            return None;
        }
        Some(Token::Clause {
            attribute,
            value: &input[value_start..value_end],
            span: name_start..value_end,
        })
    }

    /// Parse a search string. Never fails.
    pub fn parse(&self, input: &str) -> ParsedQuery {
        let mut remaining = String::with_capacity(input.len());
        let mut attribute_queries = Vec::new();

        for token in Self::tokenize(input) {
            match token {
                Token::Text(text) => remaining.push_str(text),
                Token::Clause {
                    attribute,
                    value,
                    span,
                }
                | Token::QuotedClause {
                    attribute,
                    value,
                    span,
                } => {
                    let attribute = attribute.trim();
                    if self.keys.contains(attribute) {
                        attribute_queries.push(AttributeQuery::new(attribute, value.trim()));
                    } else {
                        remaining.push_str(&input[span]);
                    }
                }
            }
        }

        ParsedQuery {
            query: remaining.trim().to_string(),
            attribute_queries,
        }
    }

    /// Render a parsed query: free text first, then clauses in order.
    ///
    /// Values holding more than one whitespace-delimited word, and empty
    /// values, are quoted.
    pub fn build(&self, parsed: &ParsedQuery) -> Result<String, SearchError> {
        let mut parts: Vec<String> = Vec::with_capacity(parsed.attribute_queries.len() + 1);

        let query = parsed.query.trim();
        if !query.is_empty() {
            parts.push(query.to_string());
        }

        for clause in &parsed.attribute_queries {
            if !self.keys.contains(&clause.attribute) {
                return Err(SearchError::UnknownAttribute(clause.attribute.clone()));
            }
            let value = clause.value.trim();
            if value.split_whitespace().count() == 1 {
                parts.push(format!("{}:{}", clause.attribute, value));
            } else {
                parts.push(format!("{}:\"{}\"", clause.attribute, value));
            }
        }

        Ok(parts.join(" ").trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AttributeKeys {
        AttributeKeys::new()
            .with("author", "manifest.author")
            .with("tag", "meta.tags")
            .with("nsfw", "meta.nsfw")
    }

    #[test]
    fn test_basic_parsing() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("hello world");
        assert_eq!(parsed.query, "hello world");
        assert!(parsed.attribute_queries.is_empty());
    }

    #[test]
    fn test_unknown_attribute_passthrough() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("madeupattr:foo hello");
        assert_eq!(parsed.query, "madeupattr:foo hello");
        assert!(parsed.attribute_queries.is_empty());
    }

    #[test]
    fn test_quoted_multi_word_values_keep_order() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse(r#"author:"Jane Doe" tag:cute"#);
        assert_eq!(parsed.query, "");
        assert_eq!(
            parsed.attribute_queries,
            vec![
                AttributeQuery::new("author", "Jane Doe"),
                AttributeQuery::new("tag", "cute"),
            ]
        );
    }

    #[test]
    fn test_mixed_free_text_and_clauses() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("hello tag:cute world");
        // the removed span leaves its surrounding whitespace behind
        assert_eq!(parsed.query, "hello  world");
        assert_eq!(parsed.attribute_queries, vec![AttributeQuery::new("tag", "cute")]);
    }

    #[test]
    fn test_repeated_attribute_not_merged() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("tag:cat tag:dog");
        assert_eq!(
            parsed.attribute_queries,
            vec![AttributeQuery::new("tag", "cat"), AttributeQuery::new("tag", "dog")]
        );
    }

    #[test]
    fn test_empty_quoted_value() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse(r#"tag:"""#);
        assert_eq!(parsed.query, "");
        assert_eq!(parsed.attribute_queries, vec![AttributeQuery::new("tag", "")]);
    }

    #[test]
    fn test_quoted_value_trimmed() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse(r#"author:"  Jane  ""#);
        assert_eq!(parsed.attribute_queries, vec![AttributeQuery::new("author", "Jane")]);
    }

    #[test]
    fn test_unterminated_quote_is_text() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse(r#"author:"Jane Doe"#);
        assert_eq!(parsed.query, r#"author:"Jane Doe"#);
        assert!(parsed.attribute_queries.is_empty());
    }

    #[test]
    fn test_colon_inside_quotes_falls_back_to_unquoted_clause() {
        let keys = keys();
        // the quoted body may not hold a colon, so this is not a quoted
        // clause; scanning resumes and picks up `tag:cute`, leaving
        // `author:""` behind as free text
        let parsed = QueryParser::new(&keys).parse(r#"author:"tag:cute""#);
        assert_eq!(parsed.attribute_queries, vec![AttributeQuery::new("tag", "cute")]);
        assert_eq!(parsed.query, r#"author:"""#);
    }

    #[test]
    fn test_value_stops_at_colon() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("tag:cute:extra");
        assert_eq!(parsed.attribute_queries, vec![AttributeQuery::new("tag", "cute")]);
        assert_eq!(parsed.query, ":extra");
    }

    #[test]
    fn test_unregistered_clause_consumes_its_span() {
        let keys = keys();
        // `foo:tag` is one clause; `tag` here is its value, not an attribute
        let parsed = QueryParser::new(&keys).parse("foo:tag:cute");
        assert!(parsed.attribute_queries.is_empty());
        assert_eq!(parsed.query, "foo:tag:cute");
    }

    #[test]
    fn test_dangling_colon() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("tag: cute");
        assert!(parsed.attribute_queries.is_empty());
        assert_eq!(parsed.query, "tag: cute");
    }

    #[test]
    fn test_empty_query() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("   ");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_unicode_values() {
        let keys = keys();
        let parsed = QueryParser::new(&keys).parse("tag:café 猫");
        assert_eq!(parsed.attribute_queries, vec![AttributeQuery::new("tag", "café")]);
        assert_eq!(parsed.query, "猫");
    }

    #[test]
    fn test_tokenize_covers_input() {
        let input = r#"hi tag:cute author:"Jane Doe" bye"#;
        let tokens = QueryParser::tokenize(input);
        assert_eq!(
            tokens,
            vec![
                Token::Text("hi "),
                Token::Clause {
                    attribute: "tag",
                    value: "cute",
                    span: 3..11,
                },
                Token::Text(" "),
                Token::QuotedClause {
                    attribute: "author",
                    value: "Jane Doe",
                    span: 12..29,
                },
                Token::Text(" bye"),
            ]
        );
    }

    #[test]
    fn test_build_query_string() {
        let keys = keys();
        let parsed = ParsedQuery {
            query: " hello ".to_string(),
            attribute_queries: vec![
                AttributeQuery::new("tag", "cute"),
                AttributeQuery::new("author", "Jane Doe"),
            ],
        };
        let built = QueryParser::new(&keys).build(&parsed).unwrap();
        assert_eq!(built, r#"hello tag:cute author:"Jane Doe""#);
    }

    #[test]
    fn test_build_without_free_text() {
        let keys = keys();
        let parsed = ParsedQuery {
            query: String::new(),
            attribute_queries: vec![AttributeQuery::new("nsfw", "false")],
        };
        assert_eq!(QueryParser::new(&keys).build(&parsed).unwrap(), "nsfw:false");
    }

    #[test]
    fn test_build_quotes_empty_value() {
        let keys = keys();
        let parsed = ParsedQuery {
            query: String::new(),
            attribute_queries: vec![AttributeQuery::new("tag", "")],
        };
        let parser = QueryParser::new(&keys);
        let built = parser.build(&parsed).unwrap();
        assert_eq!(built, r#"tag:"""#);
        assert_eq!(parser.parse(&built), parsed);
    }

    #[test]
    fn test_build_unknown_attribute() {
        let keys = keys();
        let parsed = ParsedQuery {
            query: "hello".to_string(),
            attribute_queries: vec![AttributeQuery::new("colour", "red")],
        };
        let err = QueryParser::new(&keys).build(&parsed).unwrap_err();
        assert!(matches!(err, SearchError::UnknownAttribute(name) if name == "colour"));
    }

    #[test]
    fn test_parsed_query_json_shape() {
        let parsed = ParsedQuery {
            query: "hello".to_string(),
            attribute_queries: vec![AttributeQuery::new("tag", "cute")],
        };
        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, r#"{"query":"hello","attribute_queries":[{"tag":"cute"}]}"#);

        let back: ParsedQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parsed);

        let bad = serde_json::from_str::<AttributeQuery>(r#"{"a":"1","b":"2"}"#);
        assert!(bad.is_err());
    }
}
