//! Network Monitor Filter Query
//!
//! This crate turns the filter box text into a [`ParsedQuery`] and produces
//! autocomplete suggestions for it. Evaluation lives in `nf-core`.

pub mod autocomplete;
pub mod parser;

pub use autocomplete::{autocomplete, base_flag_list, observed_values, Suggestion};
pub use parser::{normalize_flag_value, parse_filters, parse_size};

use nf_core::{FilterPrefs, Matcher, ParsedQuery, RequestRecord};

/// Does a record match the raw filter box text? Empty text matches all.
pub fn is_freetext_match(record: &RequestRecord, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let query = parse_filters(text);
    Matcher::new(&query).matches(record)
}

/// Parse once and keep the records that match, in input order.
pub fn filter_requests<'r>(
    records: &'r [RequestRecord],
    text: &str,
    prefs: &FilterPrefs,
) -> Vec<&'r RequestRecord> {
    let query: ParsedQuery = parse_filters(text);
    Matcher::new(&query).with_prefs(prefs).filter(records)
}
