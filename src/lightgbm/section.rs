//! Section-oriented view of the LightGBM text format.
//!
//! A model file is a sequence of blocks separated by blank lines. The first
//! line of each block is its identifier (`tree`, `Tree=3`,
//! `feature_importances:`, ...) and the remaining lines are `key=value` pairs.

use std::str::FromStr;

use crate::error::{ModelError, Result};

// =============================================================================
// Section
// =============================================================================

/// One textual block: an identifier plus ordered key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    id: String,
    entries: Vec<(String, String)>,
}

impl Section {
    /// Create an empty section with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
        }
    }

    /// Block identifier (the first line of the block).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if the identifier equals `id` exactly.
    pub fn check_id(&self, id: &str) -> bool {
        self.id == id
    }

    /// True if the identifier satisfies `predicate`.
    pub fn check_id_with(&self, predicate: impl Fn(&str) -> bool) -> bool {
        predicate(&self.id)
    }

    /// Insert or replace a key/value pair. Insertion order is preserved.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Split `token` on the first `separator` and insert the halves as a
    /// key/value pair.
    ///
    /// Used to merge inline parameters such as `sigmoid:1` into a copy of
    /// the header section.
    pub fn put_token(&mut self, token: &str, separator: char) -> Result<()> {
        let (key, value) = token.split_once(separator).ok_or_else(|| {
            ModelError::malformed(
                &self.id,
                token,
                token,
                format!("expected `key{separator}value`"),
            )
        })?;
        self.put(key, value);
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Ordered key/value pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    /// Value for `key`, failing with [`ModelError::MissingKey`] if absent.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| ModelError::MissingKey {
            section: self.id.clone(),
            key: key.to_string(),
        })
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.get_parsed(key, "integer")
    }

    pub fn get_double(&self, key: &str) -> Result<f64> {
        self.get_parsed(key, "double")
    }

    /// Whitespace-separated tokens of `key`.
    ///
    /// With `Some(n)` the value must contain exactly `n` tokens. With `None`
    /// any non-zero number of tokens is accepted.
    pub fn get_string_array(&self, key: &str, expected: Option<usize>) -> Result<Vec<String>> {
        let value = self.get_string(key)?;
        let tokens: Vec<String> = value.split_whitespace().map(str::to_string).collect();

        match expected {
            Some(expected) if tokens.len() != expected => Err(ModelError::ArrayLengthMismatch {
                field: key.to_string(),
                expected,
                actual: tokens.len(),
            }),
            None if tokens.is_empty() => Err(ModelError::malformed(
                &self.id,
                key,
                value,
                "expected at least one token",
            )),
            _ => Ok(tokens),
        }
    }

    /// Whitespace-separated values of `key`, each parsed as `T`.
    pub(crate) fn get_parsed_array<T: FromStr>(&self, key: &str) -> Result<Vec<T>> {
        let value = self.get_string(key)?;
        value
            .split_whitespace()
            .map(|token| {
                token.parse().map_err(|_| {
                    ModelError::malformed(&self.id, key, token, "invalid array element")
                })
            })
            .collect()
    }

    fn get_parsed<T: FromStr>(&self, key: &str, kind: &str) -> Result<T> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse()
            .map_err(|_| ModelError::malformed(&self.id, key, value, format!("invalid {kind}")))
    }
}

// =============================================================================
// Lexer
// =============================================================================

/// Split LightGBM model text into sections.
///
/// Blank lines end the current section. A line starting with `end of ` is
/// always a section of its own, because LightGBM writes `end of parameters`
/// directly after the parameter lines. Lines without `=` become keys with an
/// empty value.
pub fn parse_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for line in content.lines() {
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            sections.extend(current.take());
            continue;
        }

        if line.starts_with("end of ") {
            sections.extend(current.take());
            sections.push(Section::new(line));
            continue;
        }

        match current.as_mut() {
            None => current = Some(Section::new(line)),
            Some(section) => match line.split_once('=') {
                Some((key, value)) => section.put(key, value),
                None => section.put(line, ""),
            },
        }
    }
    sections.extend(current);

    sections
}

// =============================================================================
// Tests
// =============================================================================
