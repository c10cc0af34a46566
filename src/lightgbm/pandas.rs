//! Parser for the trailing `pandas_categorical:` literal.
//!
//! The Python package appends the category labels of every pandas
//! `category` column as a JSON-like list of lists:
//!
//! ```text
//! pandas_categorical:[["a", "b"], [1, 2, 3]]
//! pandas_categorical:null
//! ```

use crate::error::{ModelError, Result};

/// Identifier prefix of the pandas categorical section.
pub const PANDAS_CATEGORICAL_PREFIX: &str = "pandas_categorical:";

/// Parse a full section identifier (`pandas_categorical:...`) into the
/// ordered label lists.
pub fn parse_pandas_categorical(id: &str) -> Result<Vec<Vec<String>>> {
    let literal = id
        .strip_prefix(PANDAS_CATEGORICAL_PREFIX)
        .ok_or_else(|| ModelError::CategoricalLiteralMalformed(id.to_string()))?;

    if literal == "null" {
        return Ok(Vec::new());
    }

    let mut rest = literal
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ModelError::CategoricalLiteralMalformed(literal.to_string()))?;

    let mut result = Vec::new();
    while let Some(end) = rest.find(']') {
        let inner = rest[..end]
            .strip_prefix('[')
            .ok_or_else(|| ModelError::CategoricalLiteralMalformed(rest[..=end].to_string()))?;

        result.push(parse_labels(inner));

        rest = &rest[end + 1..];
        rest = rest.strip_prefix(", ").unwrap_or(rest);
    }

    if !rest.is_empty() {
        return Err(ModelError::CategoricalLiteralMalformed(rest.to_string()));
    }

    Ok(result)
}

/// Split one sub-list. An empty sub-list yields a single empty label.
fn parse_labels(inner: &str) -> Vec<String> {
    inner
        .split(", ")
        .map(|token| {
            let token = if token.len() > 1 && token.starts_with('"') && token.ends_with('"') {
                &token[1..token.len() - 1]
            } else {
                token
            };
            unescape(token)
        })
        .collect()
}

/// Resolve JSON-style backslash escapes. Unknown escapes keep the escaped
/// character; a trailing lone backslash is kept as is.
pub fn unescape(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            None => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match decode_unicode_escape(&hex, &mut chars) {
                    Some(decoded) => out.push(decoded),
                    None => out.push('u'),
                }
            }
            Some(other) => out.push(other),
        }
    }
    out
}

/// Decode the code point following `\u`, advancing `chars` past it.
/// Surrogate pairs written as two escapes are joined.
fn decode_unicode_escape(hex: &str, chars: &mut std::str::Chars<'_>) -> Option<char> {
    if hex.len() != 4 {
        return None;
    }
    let high = u32::from_str_radix(hex, 16).ok()?;
    for _ in 0..4 {
        chars.next();
    }

    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).or(Some(char::REPLACEMENT_CHARACTER));
    }

    let lookahead: String = chars.clone().take(6).collect();
    let low = lookahead
        .strip_prefix("\\u")
        .and_then(|h| u32::from_str_radix(h, 16).ok())
        .filter(|low| (0xDC00..0xE000).contains(low));

    match low {
        Some(low) => {
            for _ in 0..6 {
                chars.next();
            }
            char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
        }
        None => Some(char::REPLACEMENT_CHARACTER),
    }
}
