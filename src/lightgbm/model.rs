//! Model assembly from sections and schema derivation.
//!
//! Sections are consumed strictly in order:
//!
//! 1. `tree` header (mandatory)
//! 2. `Tree=0`, `Tree=1`, ... until the first identifier that does not match
//! 3. `end of trees` (optional)
//! 4. feature importances (optional)
//! 5. `parameters:` plus `end of parameters` (optional, skipped)
//! 6. `pandas_categorical:...` (optional)
//!
//! An optional phase that does not match leaves the cursor where it is.
//! Anything after the last recognised section is ignored.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace};

use crate::config::ExportConfig;
use crate::error::{ModelError, Result};
use crate::schema::{
    CategorySource, DataType, ExportModel, Feature, FeatureKind, InvalidValueTreatment, Schema,
    Value,
};

use super::consensus::TriState;
use super::feature_info::{FeatureInfo, CATEGORY_MISSING};
use super::objective::ObjectiveFunction;
use super::pandas::{parse_pandas_categorical, PANDAS_CATEGORICAL_PREFIX};
use super::role::{reconcile, FeatureRole};
use super::section::{parse_sections, Section};
use super::tree::Tree;

/// Identifier of the header section.
pub const HEADER_ID: &str = "tree";
/// Identifier marking the end of the tree blocks.
pub const END_OF_TREES_ID: &str = "end of trees";
/// Feature importance identifiers (older writers use a space).
pub const FEATURE_IMPORTANCES_IDS: [&str; 2] = ["feature_importances:", "feature importances:"];
pub const PARAMETERS_ID: &str = "parameters:";
pub const END_OF_PARAMETERS_ID: &str = "end of parameters";

/// Format versions this loader understands.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["v2", "v3"];

/// Name written into exported models.
pub const ALGORITHM_NAME: &str = "LightGBM";

/// Expected identifier of the `index`-th tree block.
pub fn tree_id(index: usize) -> String {
    format!("Tree={index}")
}

// =============================================================================
// Model
// =============================================================================

/// An assembled LightGBM gradient-boosted tree model.
///
/// Immutable once loaded.
#[derive(Debug, Clone)]
pub struct GbdtModel {
    version: Option<String>,
    max_feature_idx: usize,
    label_index: usize,
    feature_names: Vec<String>,
    feature_infos: Vec<String>,
    boost_from_average: bool,
    objective: ObjectiveFunction,
    trees: Vec<Tree>,
    feature_importances: HashMap<String, String>,
    pandas_categorical: Vec<Vec<String>>,
}

impl GbdtModel {
    /// Load a model from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading LightGBM model");
        let content = std::fs::read_to_string(path)?;
        Self::from_string(&content)
    }

    /// Parse a model from its text representation.
    pub fn from_string(content: &str) -> Result<Self> {
        Self::load(&parse_sections(content))
    }

    /// Assemble a model from already lexed sections.
    pub fn load(sections: &[Section]) -> Result<Self> {
        let header = read_header(sections)?;
        let (trees, cursor) = read_trees(sections, 1)?;
        let cursor = skip_section(sections, cursor, END_OF_TREES_ID);
        let (feature_importances, cursor) =
            read_feature_importances(sections, cursor, &header.feature_names);
        let cursor = skip_parameters(sections, cursor);
        let (pandas_categorical, cursor) = read_pandas_categorical(sections, cursor)?;

        if cursor < sections.len() {
            trace!(
                ignored = sections.len() - cursor,
                next = sections[cursor].id(),
                "ignoring trailing sections"
            );
        }

        Ok(GbdtModel {
            version: header.version,
            max_feature_idx: header.max_feature_idx,
            label_index: header.label_index,
            feature_names: header.feature_names,
            feature_infos: header.feature_infos,
            boost_from_average: header.boost_from_average,
            objective: header.objective,
            trees,
            feature_importances,
            pandas_categorical,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn max_feature_idx(&self) -> usize {
        self.max_feature_idx
    }

    pub fn label_index(&self) -> usize {
        self.label_index
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_infos(&self) -> &[String] {
        &self.feature_infos
    }

    pub fn boost_from_average(&self) -> bool {
        self.boost_from_average
    }

    pub fn objective(&self) -> &ObjectiveFunction {
        &self.objective
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of features (`max_feature_idx + 1`).
    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Raw importance values, keyed by feature name.
    pub fn feature_importances(&self) -> &HashMap<String, String> {
        &self.feature_importances
    }

    pub fn pandas_categorical(&self) -> &[Vec<String>] {
        &self.pandas_categorical
    }

    /// Parsed importance of `name`, if the model recorded one.
    pub fn feature_importance(&self, name: &str) -> Result<Option<f64>> {
        self.feature_importances
            .get(name)
            .map(|value| {
                value.trim().parse().map_err(|_| {
                    ModelError::malformed(FEATURE_IMPORTANCES_IDS[0], name, value, "invalid double")
                })
            })
            .transpose()
    }

    // -------------------------------------------------------------------------
    // Feature roles
    // -------------------------------------------------------------------------

    /// Ensemble consensus on whether `feature` is a `{0, 1}` indicator.
    pub fn binary_consensus(&self, feature: usize) -> TriState {
        TriState::consensus(self.trees.iter().map(|tree| tree.is_binary(feature)))
    }

    /// Ensemble consensus on whether `feature` is split categorically.
    pub fn categorical_consensus(&self, feature: usize) -> TriState {
        TriState::consensus(self.trees.iter().map(|tree| tree.is_categorical(feature)))
    }

    /// Reconciled role of `feature`.
    pub fn feature_role(&self, feature: usize) -> Result<FeatureRole> {
        let info = self
            .feature_infos
            .get(feature)
            .ok_or(ModelError::FeatureIndexOutOfRange {
                index: feature,
                num_features: self.num_features(),
            })?;
        reconcile(
            info,
            self.binary_consensus(feature),
            self.categorical_consensus(feature),
        )
        .map_err(|_| ModelError::RoleContradiction {
            index: feature,
            name: self.feature_names[feature].clone(),
        })
    }

    /// Reconciled roles of all features, in declaration order.
    pub fn feature_roles(&self) -> Result<Vec<FeatureRole>> {
        (0..self.num_features())
            .map(|feature| self.feature_role(feature))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Export
    // -------------------------------------------------------------------------

    /// Describe the label and every feature for a document writer.
    pub fn encode_schema(
        &self,
        target_field: &str,
        target_categories: Option<&[String]>,
    ) -> Result<Schema> {
        let label = self.objective.encode_label(target_field, target_categories)?;

        let mut slots = PandasSlots::new(&self.pandas_categorical);
        let mut features = Vec::with_capacity(self.num_features());

        for (index, (name, info)) in self
            .feature_names
            .iter()
            .zip(&self.feature_infos)
            .enumerate()
        {
            let role = self.feature_role(index)?;
            trace!(index, feature = name.as_str(), ?role, "reconciled feature role");

            let (kind, invalid_value_treatment) = match role {
                FeatureRole::Unused => {
                    slots.skip();
                    features.push(None);
                    continue;
                }
                FeatureRole::Categorical => (
                    categorical_kind(info, &mut slots)?,
                    InvalidValueTreatment::AsMissing,
                ),
                FeatureRole::Binary => (FeatureKind::Binary, InvalidValueTreatment::AsIs),
                FeatureRole::Continuous => {
                    let interval = match FeatureInfo::parse(info)? {
                        FeatureInfo::Interval(interval) => Some(interval),
                        FeatureInfo::Values(_) | FeatureInfo::Unused => None,
                    };
                    (
                        FeatureKind::Continuous { interval },
                        InvalidValueTreatment::AsIs,
                    )
                }
            };

            features.push(Some(Feature {
                name: name.clone(),
                index,
                kind,
                invalid_value_treatment,
                importance: self.feature_importance(name)?,
            }));
        }

        slots.finish()?;

        Ok(Schema { label, features })
    }

    /// Produce everything an exporter needs: schema plus ensemble plan.
    pub fn encode(&self, config: &ExportConfig) -> Result<ExportModel> {
        let schema = self.encode_schema(
            &config.target_field,
            config.target_categories.as_deref(),
        )?;
        let ensemble = self
            .objective
            .encode_ensemble(self.num_trees(), config.num_iterations);

        debug!(
            features = schema.active_features().count(),
            iterations = ensemble.num_iterations,
            "encoded model"
        );

        Ok(ExportModel {
            algorithm_name: ALGORITHM_NAME,
            schema,
            ensemble,
        })
    }
}

// =============================================================================
// Pandas slot bookkeeping
// =============================================================================

/// Walks the pandas categorical table in declaration order. Inactive when
/// the table is empty.
struct PandasSlots<'a> {
    table: &'a [Vec<String>],
    consumed: usize,
}

impl<'a> PandasSlots<'a> {
    fn new(table: &'a [Vec<String>]) -> Self {
        Self { table, consumed: 0 }
    }

    fn is_active(&self) -> bool {
        !self.table.is_empty()
    }

    fn skip(&mut self) {
        if self.is_active() {
            self.consumed += 1;
        }
    }

    /// Next label list, or an error when the table is exhausted.
    fn take(&mut self) -> Result<&'a [String]> {
        let labels = self
            .table
            .get(self.consumed)
            .ok_or_else(|| ModelError::PandasSlotCountMismatch {
                expected: self.table.len(),
                consumed: self.consumed + 1,
            })?;
        self.consumed += 1;
        Ok(labels.as_slice())
    }

    fn finish(self) -> Result<()> {
        if self.is_active() && self.consumed != self.table.len() {
            return Err(ModelError::PandasSlotCountMismatch {
                expected: self.table.len(),
                consumed: self.consumed,
            });
        }
        Ok(())
    }
}

fn categorical_kind(info: &str, slots: &mut PandasSlots<'_>) -> Result<FeatureKind> {
    if slots.is_active() {
        let labels = slots.take()?;
        let data_type = DataType::infer(labels);
        let values = labels
            .iter()
            .map(|label| Value::coerce(label, data_type))
            .collect();
        return Ok(FeatureKind::Categorical {
            data_type,
            values,
            source: CategorySource::Pandas,
        });
    }

    let FeatureInfo::Values(mut codes) = FeatureInfo::parse(info)? else {
        return Err(ModelError::malformed(
            HEADER_ID,
            "feature_infos",
            info,
            "categorical feature without category codes",
        ));
    };
    codes.retain(|&code| code != CATEGORY_MISSING);
    codes.sort_unstable();

    Ok(FeatureKind::Categorical {
        data_type: DataType::Integer,
        values: codes.into_iter().map(Value::Integer).collect(),
        source: CategorySource::FeatureInfo,
    })
}

// =============================================================================
// Assembly phases
// =============================================================================

struct Header {
    version: Option<String>,
    max_feature_idx: usize,
    label_index: usize,
    feature_names: Vec<String>,
    feature_infos: Vec<String>,
    boost_from_average: bool,
    objective: ObjectiveFunction,
}

fn read_header(sections: &[Section]) -> Result<Header> {
    let section = sections
        .first()
        .filter(|section| section.check_id(HEADER_ID))
        .ok_or_else(|| ModelError::MissingSection {
            expected: HEADER_ID.to_string(),
            found: sections.first().map(|s| s.id().to_string()),
        })?;

    let version = section.get("version").map(str::to_string);
    if let Some(version) = &version {
        if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
            return Err(ModelError::UnsupportedVersion(version.clone()));
        }
    }

    let max_feature_idx = non_negative(section, "max_feature_idx")?;
    let label_index = non_negative(section, "label_index")?;
    let num_features = max_feature_idx + 1;
    let feature_names = section.get_string_array("feature_names", Some(num_features))?;
    let feature_infos = section.get_string_array("feature_infos", Some(num_features))?;
    let boost_from_average = section.contains_key("boost_from_average");
    let objective = ObjectiveFunction::load(section)?;

    debug!(
        version = version.as_deref().unwrap_or("<none>"),
        num_features,
        ?objective,
        "read model header"
    );

    Ok(Header {
        version,
        max_feature_idx,
        label_index,
        feature_names,
        feature_infos,
        boost_from_average,
        objective,
    })
}

/// Consume `Tree=0`, `Tree=1`, ... starting at `cursor`.
fn read_trees(sections: &[Section], mut cursor: usize) -> Result<(Vec<Tree>, usize)> {
    let mut trees = Vec::new();
    while let Some(section) = sections.get(cursor) {
        if !section.check_id(&tree_id(trees.len())) {
            break;
        }
        trees.push(Tree::load(section)?);
        cursor += 1;
    }
    debug!(num_trees = trees.len(), "read tree blocks");
    Ok((trees, cursor))
}

/// Advance past the section at `cursor` if its identifier is `id`.
fn skip_section(sections: &[Section], cursor: usize, id: &str) -> usize {
    match sections.get(cursor) {
        Some(section) if section.check_id(id) => cursor + 1,
        _ => cursor,
    }
}

fn read_feature_importances(
    sections: &[Section],
    cursor: usize,
    feature_names: &[String],
) -> (HashMap<String, String>, usize) {
    let Some(section) = sections
        .get(cursor)
        .filter(|s| FEATURE_IMPORTANCES_IDS.iter().any(|id| s.check_id(id)))
    else {
        return (HashMap::new(), cursor);
    };

    let mut importances = HashMap::new();
    for (name, value) in section.entries() {
        if feature_names.iter().any(|n| n == name) {
            importances.insert(name.to_string(), value.to_string());
        } else {
            trace!(feature = name, "dropping importance of unknown feature");
        }
    }
    debug!(count = importances.len(), "read feature importances");

    (importances, cursor + 1)
}

fn skip_parameters(sections: &[Section], cursor: usize) -> usize {
    let after = skip_section(sections, cursor, PARAMETERS_ID);
    if after == cursor {
        return cursor;
    }
    trace!("skipped parameters block");
    skip_section(sections, after, END_OF_PARAMETERS_ID)
}

fn read_pandas_categorical(
    sections: &[Section],
    cursor: usize,
) -> Result<(Vec<Vec<String>>, usize)> {
    match sections.get(cursor) {
        Some(section) if section.check_id_with(|id| id.starts_with(PANDAS_CATEGORICAL_PREFIX)) => {
            let table = parse_pandas_categorical(section.id())?;
            debug!(entries = table.len(), "read pandas categorical table");
            Ok((table, cursor + 1))
        }
        _ => Ok((Vec::new(), cursor)),
    }
}

fn non_negative(section: &Section, key: &str) -> Result<usize> {
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

// =============================================================================
// Tests
// =============================================================================
