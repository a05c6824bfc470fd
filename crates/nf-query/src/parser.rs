use nf_core::types::{FilterFlag, FlagFilter, FlagValue, ParsedQuery};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Parse a search string into free-text terms and flag predicates.
///
/// Never fails: unknown `key:value` tokens stay free text verbatim and
/// unparseable sizes become `FlagValue::Size(None)`.
pub fn parse_filters(query: &str) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();

    for token in query.split_whitespace() {
        match parse_flag_token(token) {
            Some(filter) => parsed.flags.push(filter),
            None => parsed.text.push(token.to_string()),
        }
    }

    parsed
}

/// Split a `[-]flag:value` token. `None` means the token is free text.
fn parse_flag_token(token: &str) -> Option<FlagFilter> {
    let (key, value) = token.split_once(':')?;

    let (negative, name) = match key.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, key),
    };

    let Some(flag) = FilterFlag::from_name(name) else {
        log::debug!("'{}' is not a filter flag, treating as text", token);
        return None;
    };

    Some(FlagFilter {
        flag,
        value: normalize_flag_value(flag, value),
        negative,
    })
}

/// Apply the per-flag value rule.
pub fn normalize_flag_value(flag: FilterFlag, value: &str) -> FlagValue {
    if value.is_empty() {
        return FlagValue::Text(String::new());
    }

    if flag.is_size() {
        let size = parse_size(value);
        if size.is_none() {
            log::debug!("{}:{} is not a size", flag, value);
        }
        return FlagValue::Size(size);
    }

    match flag {
        FilterFlag::Regexp => FlagValue::Text(value.to_string()),
        _ => FlagValue::Text(value.to_lowercase()),
    }
}

/// Parse a byte count with an optional `k` or `m` suffix.
///
/// Suffixes are case-sensitive. An empty magnitude (`k` alone) counts as 0.
pub fn parse_size(value: &str) -> Option<f64> {
    let (number, multiplier) = if let Some(rest) = value.strip_suffix('k') {
        (rest, KIB)
    } else if let Some(rest) = value.strip_suffix('m') {
        (rest, MIB)
    } else {
        (value, 1.0)
    };

    parse_number(number).map(|quantity| quantity * multiplier)
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    if let Some(n) = parse_radix_literal(text) {
        return Some(n);
    }
    // f64::from_str also accepts "inf" and "nan" spellings; a size must be finite.
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Unsigned `0x`, `0o` or `0b` integer literal, prefix in either case.
fn parse_radix_literal(text: &str) -> Option<f64> {
    let prefix = text.get(..2)?.to_ascii_lowercase();
    let radix = match prefix.as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|n| n as f64)
}
