//! Filter preferences snapshot.
//!
//! The host owns persistence; the evaluator only ever sees a snapshot passed
//! in at call time.

use serde::Deserialize;

use crate::record::{LoadError, RequestRecord};
use crate::types::RequestFilterTypes;

/// Preferences that narrow the request list beyond the search string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterPrefs {
    pub request_types: RequestFilterTypes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPrefs {
    #[serde(default)]
    request_types: Vec<String>,
}

impl FilterPrefs {
    /// Parse a JSON snapshot such as `{"requestTypes": ["html", "js"]}`.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let raw: RawPrefs = serde_json::from_str(text).map_err(|source| LoadError::Json {
            line: source.line(),
            source,
        })?;
        Self::from_type_names(&raw.request_types)
    }

    /// Build from category names; an empty list means no restriction.
    pub fn from_type_names<S: AsRef<str>>(names: &[S]) -> Result<Self, LoadError> {
        let mut request_types = RequestFilterTypes::empty();
        for name in names {
            let name = name.as_ref();
            let mask = RequestFilterTypes::from_pref_name(name)
                .ok_or_else(|| LoadError::UnknownRequestType(name.to_string()))?;
            request_types |= mask;
        }
        if request_types.is_empty() {
            request_types = RequestFilterTypes::ALL;
        }
        Ok(Self { request_types })
    }
}

// =============================================================================
// Request Classification
// =============================================================================

impl RequestFilterTypes {
    /// Categories a record falls into. Anything unclassified is `OTHER`.
    pub fn classify(record: &RequestRecord) -> Self {
        let mime = record.mime_type.as_deref().unwrap_or("");
        let mut mask = Self::empty();

        if mime.contains("/html") {
            mask |= Self::HTML;
        }
        if mime.contains("/css") {
            mask |= Self::CSS;
        }
        if mime.contains("/ecmascript") || mime.contains("/javascript") || mime.contains("/x-javascript") {
            mask |= Self::JS;
        }
        if is_font(record, mime) {
            mask |= Self::FONTS;
        }
        if mime.contains("image/") {
            mask |= Self::IMAGES;
        }
        if is_media(mime) {
            mask |= Self::MEDIA;
        }

        let ws = is_websocket(record);
        if ws {
            mask |= Self::WS;
        } else if matches!(record.cause_type(), Some("xhr") | Some("fetch")) {
            mask |= Self::XHR;
        }

        if mask.is_empty() {
            mask = Self::OTHER;
        }
        mask
    }

    /// True when the record falls into any enabled category.
    pub fn matches_record(self, record: &RequestRecord) -> bool {
        self.is_unrestricted() || self.intersects(Self::classify(record))
    }
}

fn is_font(record: &RequestRecord, mime: &str) -> bool {
    if mime.contains("font/") || mime.contains("/font") {
        return true;
    }
    let url = record.url.as_str();
    url.contains(".eot") || url.contains(".ttf") || url.contains(".otf") || url.contains(".woff")
}

fn is_media(mime: &str) -> bool {
    mime.contains("audio/")
        || mime.contains("video/")
        || mime.contains("model/")
        || mime == "application/vnd.apple.mpegurl"
        || mime == "application/x-mpegurl"
}

fn is_websocket(record: &RequestRecord) -> bool {
    if record.cause_type() == Some("websocket") {
        return true;
    }
    record.response_headers().map_or(false, |headers| {
        headers
            .iter()
            .any(|h| h.name.eq_ignore_ascii_case("upgrade") && h.value.eq_ignore_ascii_case("websocket"))
    })
}
