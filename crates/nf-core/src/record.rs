//! Request records as supplied by the request-tracking collaborator.
//!
//! Every field except `url` is optional. Predicates treat a missing field as
//! non-matching; nothing here panics on partial data.

use serde::{Deserialize, Deserializer, Serialize};

use crate::url::{extract_host, extract_scheme_name};

/// Error type for loading records and prefs.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Invalid JSON at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),
    #[error("No request records found")]
    Empty,
}

// =============================================================================
// Record Parts
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub scheme: String,
    #[serde(deserialize_with = "null_as_default")]
    pub host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cause {
    #[serde(rename = "type")]
    pub cause_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseHeaders {
    #[serde(deserialize_with = "null_as_default")]
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cookie {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

// =============================================================================
// Request Record
// =============================================================================

/// A single network request as shown in the request list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestRecord {
    pub url: String,
    pub method: Option<String>,
    /// Status code as text; numeric JSON statuses are stringified
    /// (`200.0` becomes `"200"`).
    #[serde(deserialize_with = "status_from_json")]
    pub status: Option<String>,
    pub http_version: Option<String>,
    pub url_details: Option<UrlDetails>,
    pub remote_address: Option<String>,
    pub remote_port: Option<u16>,
    pub cause: Option<Cause>,
    pub mime_type: Option<String>,
    pub content_size: Option<f64>,
    pub transferred_size: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub from_cache: bool,
    pub response_headers: Option<ResponseHeaders>,
    /// Accepts both a bare cookie array and `{ "cookies": [...] }`.
    #[serde(deserialize_with = "cookies_from_json")]
    pub response_cookies: Option<Vec<Cookie>>,
}

impl RequestRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Host from `urlDetails`, falling back to the URL itself.
    pub fn host(&self) -> Option<&str> {
        match &self.url_details {
            Some(details) => Some(details.host.as_str()),
            None => extract_host(&self.url),
        }
    }

    /// Scheme from `urlDetails`, falling back to the URL itself.
    pub fn scheme(&self) -> Option<&str> {
        match &self.url_details {
            Some(details) => Some(details.scheme.as_str()),
            None => extract_scheme_name(&self.url),
        }
    }

    /// A request is still running until a status arrives.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.status.as_deref().map_or(true, str::is_empty)
    }

    pub fn cause_type(&self) -> Option<&str> {
        self.cause.as_ref()?.cause_type.as_deref()
    }

    /// Response headers, or `None` when they have not been received.
    pub fn response_headers(&self) -> Option<&[Header]> {
        self.response_headers.as_ref().map(|h| h.headers.as_slice())
    }

    /// Response cookies; absent cookies behave as an empty list.
    pub fn response_cookies(&self) -> &[Cookie] {
        self.response_cookies.as_deref().unwrap_or(&[])
    }

    /// Domain a cookie applies to, defaulting to the request host.
    pub fn cookie_domain<'a>(&'a self, cookie: &'a Cookie) -> Option<&'a str> {
        cookie.domain.as_deref().or_else(|| self.host())
    }
}

fn status_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Status {
        Text(String),
        Code(u64),
        Float(f64),
    }

    Ok(Option::<Status>::deserialize(deserializer)?.map(|status| match status {
        Status::Text(text) => text,
        Status::Code(code) => code.to_string(),
        Status::Float(code) if code.is_finite() && code.fract() == 0.0 => format!("{}", code as i64),
        Status::Float(code) => code.to_string(),
    }))
}

/// A JSON `null` reads as the field's default, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn cookies_from_json<'de, D>(deserializer: D) -> Result<Option<Vec<Cookie>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cookies {
        List(Vec<Cookie>),
        Wrapped { cookies: Vec<Cookie> },
    }

    Ok(Option::<Cookies>::deserialize(deserializer)?.map(|cookies| match cookies {
        Cookies::List(list) => list,
        Cookies::Wrapped { cookies } => cookies,
    }))
}

// =============================================================================
// Loading
// =============================================================================

/// Load records from either a JSON array or JSON Lines text.
///
/// Blank lines in JSON Lines input are skipped. Errors report 1-based lines.
pub fn load_records(text: &str) -> Result<Vec<RequestRecord>, LoadError> {
    let trimmed = text.trim_start();

    let records = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<RequestRecord>>(text).map_err(|source| LoadError::Json {
            line: source.line(),
            source,
        })?
    } else {
        let mut out = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str::<RequestRecord>(line)
                .map_err(|source| LoadError::Json { line: idx + 1, source })?;
            out.push(record);
        }
        out
    };

    if records.is_empty() {
        return Err(LoadError::Empty);
    }

    log::debug!("loaded {} request records", records.len());
    Ok(records)
}
