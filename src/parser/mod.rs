//! Payload location and news extraction
//!
//! The player news page is rendered client-side; its data ships inside a
//! single `<script id="__NEXT_DATA__">` tag. This module finds that tag,
//! decodes its JSON and hands the tree to the [`NewsExtractor`].

pub mod datetime;
pub mod extractor;
pub mod url;

pub use datetime::normalize_datetime;
pub use extractor::{ExtractStats, Extraction, NewsExtractor};
pub use url::UrlNormalizer;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::utils::error::ExtractionError;

/// `id` of the script tag carrying the page data
pub const PAYLOAD_MARKER: &str = "__NEXT_DATA__";

/// Locate and decode the embedded data payload
///
/// Missing, empty or malformed payloads are terminal for the current run;
/// they are never retried at the transport layer.
///
/// # Errors
///
/// Returns the matching [`ExtractionError`] variant
pub fn locate_payload(html: &str) -> Result<Value, ExtractionError> {
    let document = Html::parse_document(html);
    let selector = payload_selector();

    let script = document
        .select(&selector)
        .next()
        .ok_or(ExtractionError::MarkerMissing {
            marker: PAYLOAD_MARKER,
        })?;

    let text: String = script.text().collect();
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyPayload {
            marker: PAYLOAD_MARKER,
        });
    }

    let payload: Value = serde_json::from_str(&text)?;
    if payload.is_null() {
        return Err(ExtractionError::EmptyPayload {
            marker: PAYLOAD_MARKER,
        });
    }
    Ok(payload)
}

fn payload_selector() -> Selector {
    // Static selector; parse cannot fail
    Selector::parse("script#__NEXT_DATA__").expect("valid payload selector")
}
