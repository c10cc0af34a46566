//! Feature role reconciliation.
//!
//! A feature's role combines what `feature_infos` declares with how the
//! trees actually split on it.

use serde::Serialize;

use super::consensus::TriState;
use super::feature_info::{is_binary_interval, InfoShape};

/// Semantic type of an input feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureRole {
    Continuous,
    Binary,
    Categorical,
    Unused,
}

/// The evidence says a feature is both binary and categorical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleConflict;

/// Decide the role of one feature.
///
/// `binary` and `categorical` are ensemble consensus answers. Priority:
/// 1. `none` info → [`FeatureRole::Unused`]
/// 2. binary consensus → [`FeatureRole::Binary`]
/// 3. value-set info whose categorical consensus is not `False` →
///    [`FeatureRole::Categorical`]
/// 4. [`FeatureRole::Continuous`]
///
/// Binary answers only count for `[0:1]` or value-set infos, categorical
/// answers only for value-set infos; any other interval is numeric by
/// declaration. A binary consensus on a value-set info is a
/// [`RoleConflict`].
pub fn reconcile(
    info: &str,
    binary: TriState,
    categorical: TriState,
) -> Result<FeatureRole, RoleConflict> {
    let shape = InfoShape::of(info);

    if shape == InfoShape::Unused {
        return Ok(FeatureRole::Unused);
    }

    let values = shape == InfoShape::Values;

    if binary.is_true() && (values || is_binary_interval(info)) {
        if values {
            return Err(RoleConflict);
        }
        return Ok(FeatureRole::Binary);
    }

    if values && (categorical.is_true() || categorical.is_undetermined()) {
        return Ok(FeatureRole::Categorical);
    }

    Ok(FeatureRole::Continuous)
}
