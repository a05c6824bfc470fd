//! Core type definitions for the filter engine
//!
//! These types are shared by the query parser, the evaluator and the
//! autocomplete generator.

use serde::{Deserialize, Serialize};

// =============================================================================
// Filter Flags
// =============================================================================

/// A recognized `flag:value` predicate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum FilterFlag {
    StatusCode = 0,
    Method = 1,
    Protocol = 2,
    Domain = 3,
    RemoteIp = 4,
    HasResponseHeader = 5,
    Cause = 6,
    Transferred = 7,
    Size = 8,
    LargerThan = 9,
    TransferredLargerThan = 10,
    MimeType = 11,
    Is = 12,
    Scheme = 13,
    Regexp = 14,
    SetCookieDomain = 15,
    SetCookieName = 16,
    SetCookieValue = 17,
}

impl FilterFlag {
    /// Number of recognized flags.
    pub const COUNT: usize = 18;

    /// Every flag, in declaration order.
    pub const ALL: [FilterFlag; Self::COUNT] = [
        Self::StatusCode,
        Self::Method,
        Self::Protocol,
        Self::Domain,
        Self::RemoteIp,
        Self::HasResponseHeader,
        Self::Cause,
        Self::Transferred,
        Self::Size,
        Self::LargerThan,
        Self::TransferredLargerThan,
        Self::MimeType,
        Self::Is,
        Self::Scheme,
        Self::Regexp,
        Self::SetCookieDomain,
        Self::SetCookieName,
        Self::SetCookieValue,
    ];

    /// Name as typed in the filter box.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatusCode => "status-code",
            Self::Method => "method",
            Self::Protocol => "protocol",
            Self::Domain => "domain",
            Self::RemoteIp => "remote-ip",
            Self::HasResponseHeader => "has-response-header",
            Self::Cause => "cause",
            Self::Transferred => "transferred",
            Self::Size => "size",
            Self::LargerThan => "larger-than",
            Self::TransferredLargerThan => "transferred-larger-than",
            Self::MimeType => "mime-type",
            Self::Is => "is",
            Self::Scheme => "scheme",
            Self::Regexp => "regexp",
            Self::SetCookieDomain => "set-cookie-domain",
            Self::SetCookieName => "set-cookie-name",
            Self::SetCookieValue => "set-cookie-value",
        }
    }

    /// Look up a flag by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|flag| flag.as_str() == name)
    }

    /// Flags whose value is a byte count (`10k`, `2m`, `512`).
    #[inline]
    pub fn is_size(self) -> bool {
        matches!(
            self,
            Self::Size | Self::Transferred | Self::LargerThan | Self::TransferredLargerThan
        )
    }
}

impl std::fmt::Display for FilterFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Parsed Query
// =============================================================================

/// Normalized value of a flag predicate.
///
/// Serializes as a bare string, number or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// Lower-cased text (verbatim for `regexp`). A bare `flag:` carries
    /// empty text for every flag.
    Text(String),
    /// Byte count for size-like flags; `None` when the token was not numeric.
    Size(Option<f64>),
}

impl FlagValue {
    /// True for the empty value of a bare `flag:` token.
    #[inline]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    pub fn as_size(&self) -> Option<f64> {
        match self {
            Self::Size(size) => *size,
            Self::Text(_) => None,
        }
    }
}

/// One `flag:value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagFilter {
    #[serde(rename = "type")]
    pub flag: FilterFlag,
    pub value: FlagValue,
    pub negative: bool,
}

/// Result of parsing a search string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Free-text terms in input order. A term may keep its leading `-`.
    pub text: Vec<String>,
    /// Flag predicates in input order.
    pub flags: Vec<FlagFilter>,
}

impl ParsedQuery {
    /// A query with no terms and no flags matches everything.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.flags.is_empty()
    }
}

// =============================================================================
// Request Filter Types
// =============================================================================

bitflags::bitflags! {
    /// Coarse request categories toggled next to the filter box.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequestFilterTypes: u16 {
        const HTML = 1 << 0;
        const CSS = 1 << 1;
        const JS = 1 << 2;
        const XHR = 1 << 3;
        const FONTS = 1 << 4;
        const IMAGES = 1 << 5;
        const MEDIA = 1 << 6;
        const WS = 1 << 7;
        const OTHER = 1 << 8;

        /// No category restriction
        const ALL = 0x01FF;
    }
}

impl RequestFilterTypes {
    const NAMED: [(&'static str, RequestFilterTypes); 10] = [
        ("all", Self::ALL),
        ("html", Self::HTML),
        ("css", Self::CSS),
        ("js", Self::JS),
        ("xhr", Self::XHR),
        ("fonts", Self::FONTS),
        ("images", Self::IMAGES),
        ("media", Self::MEDIA),
        ("ws", Self::WS),
        ("other", Self::OTHER),
    ];

    /// Parse a single category name as stored in the prefs snapshot.
    pub fn from_pref_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::NAMED
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, mask)| *mask)
    }

    /// Names of the enabled categories; `["all"]` when unrestricted.
    pub fn names(self) -> Vec<&'static str> {
        if self.is_unrestricted() {
            return vec!["all"];
        }
        Self::NAMED[1..]
            .iter()
            .filter(|(_, mask)| self.contains(*mask))
            .map(|(name, _)| *name)
            .collect()
    }

    #[inline]
    pub fn is_unrestricted(self) -> bool {
        self.is_empty() || self.contains(Self::ALL)
    }
}

impl Default for RequestFilterTypes {
    fn default() -> Self {
        Self::ALL
    }
}
