//! A single `Tree=<n>` block.
//!
//! Only the split structure is interpreted here; leaf outputs are kept as
//! parsed so that an exporter can emit them.

use crate::error::{ModelError, Result};

use super::consensus::TriState;
use super::section::Section;

/// Threshold LightGBM uses for splits on features whose values are `{0, 1}`
/// (`kZeroThreshold`, written with full `f64` precision).
pub const BINARY_THRESHOLD: f64 = 1.000_000_018_002_509_5e-35;

// =============================================================================
// Decision type bitfield
// =============================================================================

/// Decision type of one split. LightGBM packs several flags into this
/// byte; only bit 0 (categorical split) is read here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionType {
    pub is_categorical: bool,
}

impl DecisionType {
    pub fn from_i8(value: i8) -> Self {
        DecisionType {
            is_categorical: value & 1 != 0,
        }
    }
}

// =============================================================================
// Tree
// =============================================================================

/// One decision tree of the ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub num_leaves: usize,
    pub num_cat: usize,
    /// Feature index of each internal node (size: num_leaves - 1)
    pub split_feature: Vec<usize>,
    /// Threshold of each internal node; index into `cat_boundaries` for
    /// categorical splits (size: num_leaves - 1)
    pub threshold: Vec<f64>,
    pub decision_type: Vec<DecisionType>,
    /// Child references, negative values are `!leaf_index` (size: num_leaves - 1)
    pub left_child: Vec<i32>,
    pub right_child: Vec<i32>,
    /// Output value of each leaf (size: num_leaves)
    pub leaf_value: Vec<f64>,
    pub shrinkage: f64,
    pub cat_boundaries: Vec<usize>,
    pub cat_threshold: Vec<u32>,
}

impl Tree {
    /// Parse a `Tree=<n>` section.
    pub fn load(section: &Section) -> Result<Self> {
        let num_leaves = usize_value(section, "num_leaves")?;
        let num_cat = if section.contains_key("num_cat") {
            usize_value(section, "num_cat")?
        } else {
            0
        };
        let shrinkage = if section.contains_key("shrinkage") {
            section.get_double("shrinkage")?
        } else {
            1.0
        };

        if num_leaves <= 1 {
            let leaf_value = if section.contains_key("leaf_value") {
                section.get_parsed_array("leaf_value")?
            } else {
                vec![0.0]
            };
            return Ok(Tree {
                num_leaves: 1,
                num_cat: 0,
                split_feature: Vec::new(),
                threshold: Vec::new(),
                decision_type: Vec::new(),
                left_child: Vec::new(),
                right_child: Vec::new(),
                leaf_value,
                shrinkage,
                cat_boundaries: Vec::new(),
                cat_threshold: Vec::new(),
            });
        }

        let num_splits = num_leaves - 1;

        let split_feature = section.get_parsed_array::<usize>("split_feature")?;
        validate_array_size("split_feature", &split_feature, num_splits)?;

        let threshold = section.get_parsed_array::<f64>("threshold")?;
        validate_array_size("threshold", &threshold, num_splits)?;

        let decision_type: Vec<DecisionType> = if section.contains_key("decision_type") {
            section
                .get_parsed_array::<i8>("decision_type")?
                .into_iter()
                .map(DecisionType::from_i8)
                .collect()
        } else {
            vec![DecisionType::default(); num_splits]
        };
        validate_array_size("decision_type", &decision_type, num_splits)?;

        let left_child = section.get_parsed_array::<i32>("left_child")?;
        validate_array_size("left_child", &left_child, num_splits)?;

        let right_child = section.get_parsed_array::<i32>("right_child")?;
        validate_array_size("right_child", &right_child, num_splits)?;

        let leaf_value = section.get_parsed_array::<f64>("leaf_value")?;
        validate_array_size("leaf_value", &leaf_value, num_leaves)?;

        let (cat_boundaries, cat_threshold) = if num_cat > 0 {
            let boundaries = section.get_parsed_array::<usize>("cat_boundaries")?;
            validate_array_size("cat_boundaries", &boundaries, num_cat + 1)?;
            (boundaries, section.get_parsed_array::<u32>("cat_threshold")?)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(Tree {
            num_leaves,
            num_cat,
            split_feature,
            threshold,
            decision_type,
            left_child,
            right_child,
            leaf_value,
            shrinkage,
            cat_boundaries,
            cat_threshold,
        })
    }

    /// Number of internal (split) nodes.
    pub fn num_splits(&self) -> usize {
        self.split_feature.len()
    }

    /// Whether this tree uses `feature` as a `{0, 1}` indicator.
    ///
    /// `False` as soon as one split on `feature` is categorical or uses a
    /// threshold other than [`BINARY_THRESHOLD`].
    pub fn is_binary(&self, feature: usize) -> TriState {
        let mut result = TriState::Undetermined;
        for node in self.splits_on(feature) {
            if self.decision_type[node].is_categorical
                || self.threshold[node] != BINARY_THRESHOLD
            {
                return TriState::False;
            }
            result = TriState::True;
        }
        result
    }

    /// Whether this tree splits on `feature` categorically.
    pub fn is_categorical(&self, feature: usize) -> TriState {
        let mut result = TriState::Undetermined;
        for node in self.splits_on(feature) {
            if !self.decision_type[node].is_categorical {
                return TriState::False;
            }
            result = TriState::True;
        }
        result
    }

    /// Category codes sent left by the categorical split at `node`.
    ///
    /// Returns `None` for numeric splits.
    pub fn categories_left(&self, node: usize) -> Option<Vec<u32>> {
        if !self.decision_type.get(node)?.is_categorical {
            return None;
        }
        let cat_idx = self.threshold[node] as usize;
        let start = *self.cat_boundaries.get(cat_idx)?;
        let end = *self.cat_boundaries.get(cat_idx + 1)?;
        let words = self.cat_threshold.get(start..end)?;

        let categories = words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                (0..32u32)
                    .filter(move |&bit| word & (1u32 << bit) != 0)
                    .map(move |bit| word_idx as u32 * 32 + bit)
            })
            .collect();
        Some(categories)
    }

    fn splits_on(&self, feature: usize) -> impl Iterator<Item = usize> + '_ {
        self.split_feature
            .iter()
            .enumerate()
            .filter(move |&(_, &f)| f == feature)
            .map(|(node, _)| node)
    }
}

fn usize_value(section: &Section, key: &str) -> Result<usize> {
    let value = section.get_int(key)?;
    usize::try_from(value).map_err(|_| {
        ModelError::malformed(
            section.id(),
            key,
            &value.to_string(),
            "expected a non-negative integer",
        )
    })
}

fn validate_array_size<T>(field: &str, arr: &[T], expected: usize) -> Result<()> {
    if arr.len() != expected {
        return Err(ModelError::ArrayLengthMismatch {
            field: field.to_string(),
            expected,
            actual: arr.len(),
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
