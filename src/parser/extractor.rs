//! Schema-agnostic news extraction
//!
//! The player page embeds a versioned Next.js data tree whose shape changes
//! without notice. Rather than binding to a schema, the extractor walks the
//! whole tree and treats any mapping that looks like a news entry as one.
//!
//! A mapping is a *candidate* when its keys (compared case-insensitively)
//! include at least one title-like, one url-like and one date-like key.
//! Candidates whose values are empty or whose date does not parse are
//! skipped; traversal always continues into every child regardless.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::datetime::normalize_datetime;
use super::url::UrlNormalizer;
use crate::models::NewsRecord;
use crate::utils::non_empty_trimmed;

const TITLE_KEYS: &[&str] = &["title", "headline", "name"];
const URL_KEYS: &[&str] = &["url", "permalink", "path", "slug"];
const DATE_KEYS: &[&str] = &["publishDateTime", "publishDate", "published", "date"];
const SUMMARY_KEYS: &[&str] = &["summary", "description", "standfirst"];
const ID_KEYS: &[&str] = &["id", "identifier", "slug", "urlSlug", "canonicalSlug"];

/// Joins title and raw date in synthesized identifiers
pub const IDENTIFIER_SEPARATOR: &str = "::";

/// Counters describing one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Every node (scalar, sequence, mapping) reached by the traversal
    pub nodes_visited: usize,
    /// Mappings that passed the key-set test
    pub candidates: usize,
    /// Candidates that produced a record
    pub extracted: usize,
    /// Candidates dropped for empty values or an unparseable date
    pub skipped: usize,
    /// Records discarded because a later-dated one shared the identifier
    pub duplicates: usize,
}

/// Result of an extraction pass
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Unique by identifier, newest first
    pub records: Vec<NewsRecord>,
    pub stats: ExtractStats,
}

/// Why a candidate produced no record
#[derive(Debug)]
enum Skip {
    MissingField(&'static str),
    Date(crate::utils::error::ParseError),
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing or empty {field}"),
            Self::Date(err) => write!(f, "{err}"),
        }
    }
}

/// Walks payload trees and builds [`NewsRecord`]s
#[derive(Debug, Clone)]
pub struct NewsExtractor {
    urls: UrlNormalizer,
}

impl NewsExtractor {
    pub fn new(urls: UrlNormalizer) -> Self {
        Self { urls }
    }

    /// Extract every news record from `payload`
    ///
    /// Never fails: malformed nodes are logged and skipped. An empty result
    /// is a valid outcome.
    pub fn extract(&self, payload: &Value) -> Extraction {
        let mut stats = ExtractStats::default();
        let mut found = Vec::new();

        // Pre-order DFS; children pushed in reverse so document order is kept
        let mut stack: Vec<&Value> = vec![payload];
        while let Some(node) = stack.pop() {
            stats.nodes_visited += 1;
            match node {
                Value::Array(items) => stack.extend(items.iter().rev()),
                Value::Object(map) => {
                    if is_candidate(map) {
                        stats.candidates += 1;
                        match self.build_record(map) {
                            Ok(record) => {
                                stats.extracted += 1;
                                found.push(record);
                            }
                            Err(skip) => {
                                stats.skipped += 1;
                                tracing::debug!(reason = %skip, node = %compact(node), "Skipping news candidate");
                            }
                        }
                    }
                    stack.extend(map.values().rev());
                }
                _ => {}
            }
        }

        let records = dedup_newest_first(found, &mut stats);
        if records.is_empty() {
            tracing::warn!(
                nodes = stats.nodes_visited,
                candidates = stats.candidates,
                "No news entries were parsed from the payload"
            );
        } else {
            tracing::debug!(
                records = records.len(),
                candidates = stats.candidates,
                skipped = stats.skipped,
                duplicates = stats.duplicates,
                "Extracted news records"
            );
        }

        Extraction { records, stats }
    }

    fn build_record(&self, map: &Map<String, Value>) -> Result<NewsRecord, Skip> {
        let title = first_text(map, TITLE_KEYS)
            .and_then(|t| non_empty_trimmed(&t))
            .ok_or(Skip::MissingField("title"))?;
        let url_raw = first_text(map, URL_KEYS).ok_or(Skip::MissingField("url"))?;
        let date_raw = first_text(map, DATE_KEYS).ok_or(Skip::MissingField("date"))?;

        let published = normalize_datetime(&date_raw).map_err(Skip::Date)?;
        let url = self
            .urls
            .normalize(&url_raw)
            .ok_or(Skip::MissingField("url"))?;
        let summary = first_text(map, SUMMARY_KEYS).and_then(|s| non_empty_trimmed(&s));

        Ok(NewsRecord {
            identifier: build_identifier(map),
            title,
            url,
            summary,
            published,
        })
    }
}

/// Key-set test: title-like, url-like and date-like keys all present
pub fn is_candidate(map: &Map<String, Value>) -> bool {
    let has = |group: &[&str]| {
        map.keys()
            .any(|key| group.iter().any(|g| key.eq_ignore_ascii_case(g)))
    };
    has(TITLE_KEYS) && has(URL_KEYS) && has(DATE_KEYS)
}

/// Stable dedup key for a candidate mapping
///
/// Prefers an explicit id-like field. Otherwise synthesizes
/// `title::raw_date` from the trimmed values. The synthesized form changes
/// whenever the upstream payload reformats its dates, so the same article
/// can then be seen as new again; callers must tolerate that.
pub fn build_identifier(map: &Map<String, Value>) -> String {
    if let Some(id) = first_text(map, ID_KEYS) {
        return id;
    }
    let title = first_text(map, TITLE_KEYS).unwrap_or_default();
    let published = first_text(map, DATE_KEYS).unwrap_or_default();
    format!(
        "{}{IDENTIFIER_SEPARATOR}{}",
        title.trim(),
        published.trim()
    )
}

/// First non-empty scalar among `keys`, in priority order
///
/// Exact key matches win; a case-insensitive match is accepted otherwise,
/// mirroring the case-insensitive candidacy test.
fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.get(*key)
            .or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .and_then(scalar_text)
    })
}

/// Text of a truthy scalar; containers, null, `false` and zero yield `None`
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Keep the latest-published record per identifier, then sort newest first
///
/// Ties keep the first occurrence.
fn dedup_newest_first(found: Vec<NewsRecord>, stats: &mut ExtractStats) -> Vec<NewsRecord> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(found.len());
    let mut unique: Vec<NewsRecord> = Vec::with_capacity(found.len());

    for record in found {
        match index.get(&record.identifier) {
            Some(&i) => {
                stats.duplicates += 1;
                if record.published > unique[i].published {
                    unique[i] = record;
                }
            }
            None => {
                index.insert(record.identifier.clone(), unique.len());
                unique.push(record);
            }
        }
    }

    unique.sort_by(|a, b| b.published.cmp(&a.published));
    unique
}

fn compact(node: &Value) -> String {
    let text = node.to_string();
    crate::utils::truncate_text(&text, 200)
}
