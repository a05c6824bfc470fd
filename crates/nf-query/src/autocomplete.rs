//! Filter box autocomplete.
//!
//! The last whitespace-delimited token of the search string is completed
//! either as a flag name (NAME mode) or, once a full `flag:` has been typed,
//! as one of the values observed on the current records (VALUE mode).

use std::collections::BTreeSet;

use serde::Serialize;

use nf_core::types::FilterFlag;
use nf_core::RequestRecord;

/// Values `is:` always offers.
const IS_STATES: [&str; 3] = ["cached", "from-cache", "running"];

/// One completion entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Whole search string after accepting the entry.
    pub value: String,
    /// Completed token only, for the popup list.
    pub display_value: String,
}

/// Every flag name and its negated form, each followed by ':'.
pub fn base_flag_list() -> Vec<String> {
    let positive = FilterFlag::ALL.iter().map(|f| format!("{}:", f.as_str()));
    let negative = FilterFlag::ALL.iter().map(|f| format!("-{}:", f.as_str()));
    positive.chain(negative).collect()
}

/// Complete the last token of `filter` against the given records.
pub fn autocomplete<'r, I>(filter: &str, records: I) -> Vec<Suggestion>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    if filter.is_empty() {
        return Vec::new();
    }

    // A trailing separator leaves an empty active token.
    let ends_with_space = filter.ends_with(char::is_whitespace);
    let mut tokens: Vec<&str> = filter.split_whitespace().collect();
    // Leading whitespace is an empty first token, kept in the completed value.
    if filter.starts_with(char::is_whitespace) {
        tokens.insert(0, "");
    }
    let last_token = if ends_with_space { None } else { tokens.pop() };
    let Some(last_token) = last_token else {
        return Vec::new();
    };

    let mut candidates = flag_value_candidates(last_token, records);
    if candidates.is_empty() {
        log::trace!("completing '{}' as a flag name", last_token);
        candidates = flag_name_candidates(last_token);
    }
    candidates.sort();

    candidates
        .into_iter()
        .map(|candidate| {
            let value = if tokens.is_empty() {
                candidate.clone()
            } else {
                format!("{} {}", tokens.join(" "), candidate)
            };
            Suggestion { value, display_value: candidate }
        })
        .collect()
}

fn flag_name_candidates(token: &str) -> Vec<String> {
    let token = token.to_lowercase();
    base_flag_list()
        .into_iter()
        .filter(|item| {
            let item = item.to_lowercase();
            item.starts_with(&token) && item != token
        })
        .collect()
}

/// VALUE mode candidates, or nothing when the token is not `[-]flag:...`.
fn flag_value_candidates<'r, I>(token: &str, records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let Some((key, typed)) = token.split_once(':') else {
        return Vec::new();
    };
    let name = key.strip_prefix('-').unwrap_or(key);
    let Some(flag) = FilterFlag::from_name(name) else {
        return Vec::new();
    };
    log::trace!("completing values for {}", flag);

    let mut unique = BTreeSet::new();
    if flag == FilterFlag::Is {
        unique.extend(IS_STATES.iter().map(|s| s.to_string()));
    } else {
        for record in records {
            unique.extend(observed_values(flag, record));
        }
    }

    let typed = typed.to_lowercase();
    unique
        .into_iter()
        .filter(|value| !value.is_empty())
        .filter(|value| {
            if typed.is_empty() {
                return true;
            }
            let lower = value.to_lowercase();
            lower.starts_with(&typed) && lower != typed
        })
        .map(|value| format!("{}:{}", key, value))
        .collect()
}

/// Values of `flag` present on a record. Cookie and header flags may yield
/// several; size flags and `regexp` yield none.
pub fn observed_values(flag: FilterFlag, record: &RequestRecord) -> Vec<String> {
    fn one(value: Option<&str>) -> Vec<String> {
        value.map(str::to_string).into_iter().collect()
    }

    match flag {
        FilterFlag::StatusCode => one(record.status.as_deref()),
        FilterFlag::Method => one(record.method.as_deref()),
        FilterFlag::Protocol => one(record.http_version.as_deref()),
        FilterFlag::Scheme => one(record.scheme()),
        FilterFlag::Domain => one(record.host()),
        FilterFlag::RemoteIp => one(record.remote_address.as_deref()),
        FilterFlag::Cause => one(record.cause_type()),
        FilterFlag::MimeType => one(record.mime_type.as_deref()),
        FilterFlag::HasResponseHeader => record
            .response_headers()
            .map(|headers| headers.iter().map(|h| h.name.clone()).collect())
            .unwrap_or_default(),
        FilterFlag::SetCookieName => record.response_cookies().iter().map(|c| c.name.clone()).collect(),
        FilterFlag::SetCookieValue => record.response_cookies().iter().map(|c| c.value.clone()).collect(),
        FilterFlag::SetCookieDomain => record
            .response_cookies()
            .iter()
            .filter_map(|c| record.cookie_domain(c))
            .map(str::to_string)
            .collect(),
        FilterFlag::Is => IS_STATES.iter().map(|s| s.to_string()).collect(),
        FilterFlag::Transferred
        | FilterFlag::Size
        | FilterFlag::LargerThan
        | FilterFlag::TransferredLargerThan
        | FilterFlag::Regexp => Vec::new(),
    }
}
