//! Per-feature `feature_infos` tokens.
//!
//! LightGBM writes one token per feature:
//! - `none` for features that never appeared in training data,
//! - `[min:max]` for numerical features,
//! - `v1:v2:...` (integer category codes) for categorical features.

use serde::Serialize;

use crate::error::{ModelError, Result};

/// Token written for unused features.
pub const NONE_INFO: &str = "none";

/// Token written for numerical features whose observed range is `[0, 1]`.
pub const BINARY_INTERVAL: &str = "[0:1]";

/// Category code reserved for missing category information.
pub const CATEGORY_MISSING: i64 = -1;

/// Shape of a feature info token, decided without parsing numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoShape {
    Unused,
    Interval,
    Values,
}

impl InfoShape {
    pub fn of(info: &str) -> Self {
        if info == NONE_INFO {
            InfoShape::Unused
        } else if info.starts_with('[') && info.ends_with(']') {
            InfoShape::Interval
        } else {
            InfoShape::Values
        }
    }
}

/// True for the `[0:1]` interval token.
pub fn is_binary_interval(info: &str) -> bool {
    info == BINARY_INTERVAL
}

/// Closed numeric interval `[left, right]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub left: f64,
    pub right: f64,
}

/// Parsed feature info token.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureInfo {
    Unused,
    Interval(Interval),
    Values(Vec<i64>),
}

impl FeatureInfo {
    pub fn parse(info: &str) -> Result<Self> {
        match InfoShape::of(info) {
            InfoShape::Unused => Ok(FeatureInfo::Unused),
            InfoShape::Interval => parse_interval(info).map(FeatureInfo::Interval),
            InfoShape::Values => parse_values(info).map(FeatureInfo::Values),
        }
    }
}

/// Parse `[min:max]`.
pub fn parse_interval(info: &str) -> Result<Interval> {
    let inner = info
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| malformed(info, "expected `[min:max]`"))?;

    let (left, right) = inner
        .split_once(':')
        .ok_or_else(|| malformed(info, "expected `[min:max]`"))?;

    let left: f64 = left
        .parse()
        .map_err(|_| malformed(info, "invalid interval bound"))?;
    let right: f64 = right
        .parse()
        .map_err(|_| malformed(info, "invalid interval bound"))?;

    if left > right {
        return Err(malformed(info, "interval bounds are reversed"));
    }

    Ok(Interval { left, right })
}

/// Parse `v1:v2:...` into category codes, in declaration order.
pub fn parse_values(info: &str) -> Result<Vec<i64>> {
    info.split(':')
        .map(|value| {
            value
                .parse()
                .map_err(|_| malformed(info, "invalid category code"))
        })
        .collect()
}

fn malformed(info: &str, message: &str) -> ModelError {
    ModelError::malformed("tree", "feature_infos", info, message)
}
