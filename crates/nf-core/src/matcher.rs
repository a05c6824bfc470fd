//! Predicate Evaluator
//!
//! A record is shown iff every free-text term and every flag predicate
//! matches. Each flag has exactly one rule function; the [`Matcher`] looks the
//! rule up once per predicate when it compiles a query.

use regex::Regex;

use crate::format::format_ip_and_port;
use crate::prefs::FilterPrefs;
use crate::record::RequestRecord;
use crate::types::{FilterFlag, FlagFilter, FlagValue, ParsedQuery, RequestFilterTypes};

// =============================================================================
// Operands and Rules
// =============================================================================

/// Predicate value prepared for evaluation.
#[derive(Debug)]
enum Operand<'q> {
    Text(&'q str),
    Size(Option<f64>),
    /// `None` when the pattern failed to compile.
    Pattern(Option<Regex>),
}

impl<'q> Operand<'q> {
    fn compile(flag: FilterFlag, value: &'q FlagValue) -> Self {
        match (flag, value) {
            (FilterFlag::Regexp, FlagValue::Text(source)) => match Regex::new(source) {
                Ok(re) => Operand::Pattern(Some(re)),
                Err(e) => {
                    log::debug!("regexp:{} does not compile: {}", source, e);
                    Operand::Pattern(None)
                }
            },
            (_, FlagValue::Text(text)) => Operand::Text(text),
            (_, FlagValue::Size(size)) => Operand::Size(*size),
        }
    }

    #[inline]
    fn text(&self) -> Option<&str> {
        match self {
            Operand::Text(text) => Some(*text),
            _ => None,
        }
    }

    #[inline]
    fn size(&self) -> Option<f64> {
        match self {
            Operand::Size(size) => *size,
            _ => None,
        }
    }
}

type FlagRule = fn(&RequestRecord, &Operand<'_>) -> bool;

/// The fixed rule table.
fn rule_for(flag: FilterFlag) -> FlagRule {
    match flag {
        FilterFlag::StatusCode => match_status_code,
        FilterFlag::Method => match_method,
        FilterFlag::Protocol => match_protocol,
        FilterFlag::Domain => match_domain,
        FilterFlag::RemoteIp => match_remote_ip,
        FilterFlag::HasResponseHeader => match_has_response_header,
        FilterFlag::Cause => match_cause,
        FilterFlag::Transferred => match_transferred,
        FilterFlag::Size => match_size,
        FilterFlag::LargerThan => match_larger_than,
        FilterFlag::TransferredLargerThan => match_transferred_larger_than,
        FilterFlag::MimeType => match_mime_type,
        FilterFlag::Is => match_is,
        FilterFlag::Scheme => match_scheme,
        FilterFlag::Regexp => match_regexp,
        FilterFlag::SetCookieDomain => match_set_cookie_domain,
        FilterFlag::SetCookieName => match_set_cookie_name,
        FilterFlag::SetCookieValue => match_set_cookie_value,
    }
}

/// Lower-case `haystack` and test for an already lower-cased needle.
#[inline]
fn contains_lower(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Within ±10% of `size`.
#[inline]
fn is_size_match(value: f64, size: f64) -> bool {
    value >= size - size / 10.0 && value <= size + size / 10.0
}

fn match_status_code(record: &RequestRecord, op: &Operand<'_>) -> bool {
    matches!((record.status.as_deref(), op.text()), (Some(status), Some(value)) if status == value)
}

fn match_method(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.method.as_deref(), op.text()) {
        (Some(method), Some(value)) => method.to_lowercase() == value,
        _ => false,
    }
}

fn match_protocol(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.http_version.as_deref(), op.text()) {
        (Some(version), Some(value)) => contains_lower(version, value),
        _ => false,
    }
}

fn match_domain(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.host(), op.text()) {
        (Some(host), Some(value)) => contains_lower(host, value),
        _ => false,
    }
}

fn match_remote_ip(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.remote_address.as_deref(), op.text()) {
        (Some(address), Some(value)) => {
            contains_lower(&format_ip_and_port(address, record.remote_port), value)
        }
        _ => false,
    }
}

fn match_has_response_header(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.response_headers(), op.text()) {
        (Some(headers), Some(value)) => headers.iter().any(|h| h.name.to_lowercase() == value),
        _ => false,
    }
}

fn match_cause(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.cause_type(), op.text()) {
        (Some(cause), Some(value)) => contains_lower(cause, value),
        _ => false,
    }
}

fn match_transferred(record: &RequestRecord, op: &Operand<'_>) -> bool {
    if record.from_cache {
        return false;
    }
    match (record.transferred_size, op.size()) {
        (Some(size), Some(value)) => is_size_match(value, size),
        _ => false,
    }
}

fn match_size(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.content_size, op.size()) {
        (Some(size), Some(value)) => is_size_match(value, size),
        _ => false,
    }
}

fn match_larger_than(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.content_size, op.size()) {
        (Some(size), Some(value)) => size > value,
        _ => false,
    }
}

fn match_transferred_larger_than(record: &RequestRecord, op: &Operand<'_>) -> bool {
    if record.from_cache {
        return false;
    }
    match (record.transferred_size, op.size()) {
        (Some(size), Some(value)) => size > value,
        _ => false,
    }
}

fn match_mime_type(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match (record.mime_type.as_deref(), op.text()) {
        (Some(mime), Some(value)) => mime.contains(value),
        _ => false,
    }
}

fn match_is(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match op.text() {
        Some("cached") | Some("from-cache") => {
            record.from_cache || record.status.as_deref() == Some("304")
        }
        Some("running") => record.is_running(),
        // Unknown states do not narrow the list.
        Some(_) => true,
        None => false,
    }
}

fn match_scheme(record: &RequestRecord, op: &Operand<'_>) -> bool {
    matches!((record.scheme(), op.text()), (Some(scheme), Some(value)) if scheme == value)
}

fn match_regexp(record: &RequestRecord, op: &Operand<'_>) -> bool {
    match op {
        Operand::Pattern(Some(re)) => re.is_match(&record.url),
        _ => false,
    }
}

fn match_set_cookie_domain(record: &RequestRecord, op: &Operand<'_>) -> bool {
    let Some(value) = op.text() else {
        return false;
    };
    record
        .response_cookies()
        .iter()
        .any(|cookie| record.cookie_domain(cookie).map_or(false, |domain| domain.contains(value)))
}

fn match_set_cookie_name(record: &RequestRecord, op: &Operand<'_>) -> bool {
    let Some(value) = op.text() else {
        return false;
    };
    record.response_cookies().iter().any(|c| contains_lower(&c.name, value))
}

fn match_set_cookie_value(record: &RequestRecord, op: &Operand<'_>) -> bool {
    let Some(value) = op.text() else {
        return false;
    };
    record.response_cookies().iter().any(|c| contains_lower(&c.value, value))
}

// =============================================================================
// Free Text
// =============================================================================

/// Case-insensitive URL substring test; a leading `-` inverts it.
pub fn is_text_match(record: &RequestRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let url = record.url.to_lowercase();
    let term = term.to_lowercase();
    match term.strip_prefix('-') {
        Some(rest) if !rest.is_empty() => !url.contains(rest),
        _ => url.contains(&term),
    }
}

// =============================================================================
// Matcher
// =============================================================================

struct Predicate<'q> {
    rule: FlagRule,
    operand: Operand<'q>,
    negative: bool,
    /// Bare `flag:` token
    vacuous: bool,
}

impl<'q> Predicate<'q> {
    fn compile(filter: &'q FlagFilter) -> Self {
        Self {
            rule: rule_for(filter.flag),
            operand: Operand::compile(filter.flag, &filter.value),
            negative: filter.negative,
            vacuous: filter.value.is_blank(),
        }
    }

    #[inline]
    fn evaluate(&self, record: &RequestRecord) -> bool {
        if self.vacuous {
            return true;
        }
        (self.rule)(record, &self.operand) != self.negative
    }
}

/// A parsed query compiled for repeated evaluation.
pub struct Matcher<'q> {
    text: &'q [String],
    predicates: Vec<Predicate<'q>>,
    request_types: RequestFilterTypes,
}

impl<'q> Matcher<'q> {
    /// Compile a query. Regular expressions are built once here.
    pub fn new(query: &'q ParsedQuery) -> Self {
        Self {
            text: &query.text,
            predicates: query.flags.iter().map(Predicate::compile).collect(),
            request_types: RequestFilterTypes::ALL,
        }
    }

    /// Also require records to fall into the enabled request categories.
    pub fn with_prefs(mut self, prefs: &FilterPrefs) -> Self {
        self.request_types = prefs.request_types;
        self
    }

    /// Decide whether a single record is part of the filtered view.
    pub fn matches(&self, record: &RequestRecord) -> bool {
        self.request_types.matches_record(record)
            && self.text.iter().all(|term| is_text_match(record, term))
            && self.predicates.iter().all(|p| p.evaluate(record))
    }

    /// Matching records, in input order.
    pub fn filter<'r, I>(&self, records: I) -> Vec<&'r RequestRecord>
    where
        I: IntoIterator<Item = &'r RequestRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// One-shot evaluation of a parsed query against a record.
pub fn matches(record: &RequestRecord, query: &ParsedQuery) -> bool {
    Matcher::new(query).matches(record)
}

/// Evaluate a single flag predicate, negation included.
pub fn is_flag_match(record: &RequestRecord, filter: &FlagFilter) -> bool {
    Predicate::compile(filter).evaluate(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Cause, Cookie, Header, ResponseHeaders, UrlDetails};

    fn sample() -> RequestRecord {
        RequestRecord {
            url: "https://Example.com/Static/App.js?v=2".to_string(),
            method: Some("GET".to_string()),
            status: Some("200".to_string()),
            http_version: Some("HTTP/2".to_string()),
            url_details: Some(UrlDetails {
                scheme: "https".to_string(),
                host: "Example.com".to_string(),
            }),
            remote_address: Some("93.184.216.34".to_string()),
            remote_port: Some(443),
            cause: Some(Cause { cause_type: Some("script".to_string()) }),
            mime_type: Some("application/javascript".to_string()),
            content_size: Some(10240.0),
            transferred_size: Some(4096.0),
            from_cache: false,
            response_headers: Some(ResponseHeaders {
                headers: vec![
                    Header { name: "Content-Type".into(), value: "application/javascript".into() },
                    Header { name: "ETag".into(), value: "\"abc\"".into() },
                ],
            }),
            response_cookies: Some(vec![
                Cookie { name: "SessionId".into(), value: "XyZ".into(), domain: None },
                Cookie { name: "pref".into(), value: "dark".into(), domain: Some(".cdn.net".into()) },
            ]),
        }
    }

    fn text(flag: FilterFlag, value: &str) -> FlagFilter {
        FlagFilter { flag, value: FlagValue::Text(value.to_string()), negative: false }
    }

    fn size(flag: FilterFlag, value: Option<f64>) -> FlagFilter {
        FlagFilter { flag, value: FlagValue::Size(value), negative: false }
    }

    fn negate(mut filter: FlagFilter) -> FlagFilter {
        filter.negative = true;
        filter
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = ParsedQuery::default();
        assert!(matches(&sample(), &query));
        assert!(matches(&RequestRecord::default(), &query));
    }

    #[test]
    fn test_text_terms() {
        let r = sample();
        assert!(is_text_match(&r, "static/app"));
        assert!(is_text_match(&r, "EXAMPLE"));
        assert!(!is_text_match(&r, "missing"));
        assert!(!is_text_match(&r, "-app.js"));
        assert!(is_text_match(&r, "-missing"));
        assert!(is_text_match(&r, ""));
        // A lone '-' is an ordinary substring.
        assert!(is_text_match(&r, "-") == r.url.contains('-'));
    }

    #[test]
    fn test_status_code_is_string_equality() {
        let r = sample();
        assert!(is_flag_match(&r, &text(FilterFlag::StatusCode, "200")));
        assert!(!is_flag_match(&r, &text(FilterFlag::StatusCode, "20")));
        assert!(!is_flag_match(&r, &text(FilterFlag::StatusCode, "200.0")));
        let running = RequestRecord::new("https://a.test/");
        assert!(!is_flag_match(&running, &text(FilterFlag::StatusCode, "200")));
    }

    #[test]
    fn test_method_and_protocol() {
        let r = sample();
        assert!(is_flag_match(&r, &text(FilterFlag::Method, "get")));
        assert!(!is_flag_match(&r, &text(FilterFlag::Method, "ge")));
        assert!(is_flag_match(&r, &text(FilterFlag::Protocol, "http/2")));
        assert!(is_flag_match(&r, &text(FilterFlag::Protocol, "2")));
        let bare = RequestRecord::new("https://a.test/");
        assert!(!is_flag_match(&bare, &text(FilterFlag::Protocol, "http")));
        assert!(!is_flag_match(&bare, &text(FilterFlag::Method, "get")));
    }

    #[test]
    fn test_domain_scheme_and_remote_ip() {
        let r = sample();
        assert!(is_flag_match(&r, &text(FilterFlag::Domain, "example")));
        assert!(is_flag_match(&r, &text(FilterFlag::Scheme, "https")));
        assert!(!is_flag_match(&r, &text(FilterFlag::Scheme, "http")));
        assert!(is_flag_match(&r, &text(FilterFlag::RemoteIp, "93.184")));
        assert!(is_flag_match(&r, &text(FilterFlag::RemoteIp, "34:443")));
        assert!(!is_flag_match(&RequestRecord::default(), &text(FilterFlag::RemoteIp, "1")));
    }

    #[test]
    fn test_headers_and_cause() {
        let r = sample();
        assert!(is_flag_match(&r, &text(FilterFlag::HasResponseHeader, "etag")));
        assert!(!is_flag_match(&r, &text(FilterFlag::HasResponseHeader, "etag2")));
        assert!(!is_flag_match(&RequestRecord::default(), &text(FilterFlag::HasResponseHeader, "etag")));
        assert!(is_flag_match(&r, &text(FilterFlag::Cause, "scr")));
        assert!(!is_flag_match(&RequestRecord::default(), &text(FilterFlag::Cause, "scr")));
    }

    #[test]
    fn test_size_tolerance() {
        let r = sample();
        assert!(is_flag_match(&r, &size(FilterFlag::Size, Some(10240.0))));
        assert!(is_flag_match(&r, &size(FilterFlag::Size, Some(11000.0))));
        assert!(!is_flag_match(&r, &size(FilterFlag::Size, Some(12000.0))));
        assert!(is_flag_match(&r, &size(FilterFlag::Transferred, Some(4000.0))));
        assert!(is_flag_match(&r, &size(FilterFlag::LargerThan, Some(10000.0))));
        assert!(!is_flag_match(&r, &size(FilterFlag::LargerThan, Some(10240.0))));
        assert!(is_flag_match(&r, &size(FilterFlag::TransferredLargerThan, Some(1024.0))));
    }

    #[test]
    fn test_null_size_never_matches() {
        let r = sample();
        for flag in [FilterFlag::Size, FilterFlag::Transferred, FilterFlag::LargerThan, FilterFlag::TransferredLargerThan] {
            assert!(!is_flag_match(&r, &size(flag, None)), "{flag} matched a null size");
        }
    }

    #[test]
    fn test_cached_records_never_match_transferred() {
        let mut r = sample();
        r.from_cache = true;
        for value in [0.0, 4096.0, 1e12] {
            assert!(!is_flag_match(&r, &size(FilterFlag::Transferred, Some(value))));
            assert!(!is_flag_match(&r, &size(FilterFlag::TransferredLargerThan, Some(value))));
        }
    }

    #[test]
    fn test_mime_type_is_case_sensitive_substring() {
        let r = sample();
        assert!(is_flag_match(&r, &text(FilterFlag::MimeType, "javascript")));
        assert!(!is_flag_match(&r, &text(FilterFlag::MimeType, "css")));
    }

    #[test]
    fn test_is_states() {
        let mut r = sample();
        assert!(!is_flag_match(&r, &text(FilterFlag::Is, "cached")));
        r.status = Some("304".to_string());
        assert!(is_flag_match(&r, &text(FilterFlag::Is, "cached")));
        assert!(is_flag_match(&r, &text(FilterFlag::Is, "from-cache")));
        assert!(!is_flag_match(&r, &text(FilterFlag::Is, "running")));
        r.status = None;
        assert!(is_flag_match(&r, &text(FilterFlag::Is, "running")));
        assert!(is_flag_match(&r, &text(FilterFlag::Is, "whatever")));
    }

    #[test]
    fn test_regexp() {
        let r = sample();
        let filter = FlagFilter {
            flag: FilterFlag::Regexp,
            value: FlagValue::Text(r"Static/\w+\.js".to_string()),
            negative: false,
        };
        assert!(is_flag_match(&r, &filter));
        // Case-sensitive by source.
        assert!(!is_flag_match(&r, &text(FilterFlag::Regexp, "static")));
        // Invalid pattern is a non-match, and negation still flips it.
        assert!(!is_flag_match(&r, &text(FilterFlag::Regexp, "(unclosed")));
        assert!(is_flag_match(&r, &negate(text(FilterFlag::Regexp, "(unclosed"))));
    }

    #[test]
    fn test_cookies() {
        let r = sample();
        assert!(is_flag_match(&r, &text(FilterFlag::SetCookieName, "session")));
        assert!(is_flag_match(&r, &text(FilterFlag::SetCookieValue, "xyz")));
        assert!(is_flag_match(&r, &text(FilterFlag::SetCookieDomain, "cdn.net")));
        // Cookie without domain falls back to the (unlowered) host.
        assert!(is_flag_match(&r, &text(FilterFlag::SetCookieDomain, "Example")));
        let bare = RequestRecord::new("https://a.test/");
        assert!(!is_flag_match(&bare, &text(FilterFlag::SetCookieDomain, "a.test")));
        assert!(!is_flag_match(&bare, &text(FilterFlag::SetCookieName, "x")));
    }

    #[test]
    fn test_blank_value_is_vacuous() {
        let bare = RequestRecord::default();
        for flag in FilterFlag::ALL {
            assert!(is_flag_match(&bare, &text(flag, "")));
            assert!(is_flag_match(&bare, &negate(text(flag, ""))));
        }
    }

    #[test]
    fn test_negation() {
        let r = sample();
        assert!(!is_flag_match(&r, &negate(text(FilterFlag::Method, "get"))));
        assert!(is_flag_match(&r, &negate(text(FilterFlag::Method, "post"))));
    }

    #[test]
    fn test_matcher_ands_everything() {
        let query = ParsedQuery {
            text: vec!["app".to_string()],
            flags: vec![text(FilterFlag::Method, "get"), text(FilterFlag::StatusCode, "200")],
        };
        let matcher = Matcher::new(&query);
        assert!(matcher.matches(&sample()));

        let mut other = sample();
        other.status = Some("404".to_string());
        assert!(!matcher.matches(&other));

        let records = vec![sample(), other, sample()];
        assert_eq!(matcher.filter(&records).len(), 2);
    }

    #[test]
    fn test_matcher_with_prefs() {
        let query = ParsedQuery::default();
        let css_only = FilterPrefs { request_types: RequestFilterTypes::CSS };
        assert!(!Matcher::new(&query).with_prefs(&css_only).matches(&sample()));
        let js_only = FilterPrefs { request_types: RequestFilterTypes::JS };
        assert!(Matcher::new(&query).with_prefs(&js_only).matches(&sample()));
    }
}
