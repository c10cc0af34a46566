//! Export-facing description of an assembled model.
//!
//! These types are what an interchange-document writer consumes: the target
//! label, one entry per declared feature, and the plan for summing trees into
//! outputs. They carry no behaviour beyond small constructors and serialize
//! with `serde` so that writers in other processes can consume them as JSON.

use serde::Serialize;

use crate::lightgbm::feature_info::Interval;

// =============================================================================
// Values
// =============================================================================

/// Data type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Integer,
    Double,
    String,
}

impl DataType {
    /// Narrowest type that every label can be parsed as.
    ///
    /// An empty slice is typed as [`DataType::String`].
    pub fn infer<S: AsRef<str>>(labels: &[S]) -> Self {
        if labels.is_empty() {
            return DataType::String;
        }
        if labels.iter().all(|l| l.as_ref().parse::<i64>().is_ok()) {
            DataType::Integer
        } else if labels.iter().all(|l| l.as_ref().parse::<f64>().is_ok()) {
            DataType::Double
        } else {
            DataType::String
        }
    }
}

/// A single categorical value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Double(f64),
    String(String),
}

impl Value {
    /// Convert a label to `data_type`, keeping the raw string if it does not
    /// parse.
    pub fn coerce(label: &str, data_type: DataType) -> Self {
        match data_type {
            DataType::Integer => label
                .parse()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::String(label.to_string())),
            DataType::Double => label
                .parse()
                .map(Value::Double)
                .unwrap_or_else(|_| Value::String(label.to_string())),
            DataType::String => Value::String(label.to_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

// =============================================================================
// Label
// =============================================================================

/// Target field description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Label {
    Continuous {
        name: String,
        data_type: DataType,
    },
    Categorical {
        name: String,
        data_type: DataType,
        values: Vec<Value>,
    },
}

impl Label {
    pub fn name(&self) -> &str {
        match self {
            Label::Continuous { name, .. } | Label::Categorical { name, .. } => name,
        }
    }
}

// =============================================================================
// Features
// =============================================================================

/// How values outside the declared domain are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidValueTreatment {
    /// Replace with a missing value.
    AsMissing,
    /// Pass through unchanged.
    AsIs,
}

/// Where a categorical domain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    /// Integer codes listed in `feature_infos`.
    FeatureInfo,
    /// Labels from the `pandas_categorical` table.
    Pandas,
}

/// Reconciled type of a used feature together with its value domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    Categorical {
        data_type: DataType,
        values: Vec<Value>,
        source: CategorySource,
    },
    /// Indicator feature with domain `{0, 1}`.
    Binary,
    Continuous {
        #[serde(skip_serializing_if = "Option::is_none")]
        interval: Option<Interval>,
    },
}

/// A used input feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub name: String,
    /// Position in the model's feature arrays.
    pub index: usize,
    pub kind: FeatureKind,
    pub invalid_value_treatment: InvalidValueTreatment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
}

impl Feature {
    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FeatureKind::Categorical { .. })
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.kind, FeatureKind::Binary)
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self.kind, FeatureKind::Continuous { .. })
    }
}

/// Label plus features in declaration order. `None` marks an unused feature,
/// so `features[i]` always corresponds to model feature `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub label: Label,
    pub features: Vec<Option<Feature>>,
}

impl Schema {
    /// Used features only.
    pub fn active_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().flatten()
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.active_features().find(|f| f.name == name)
    }
}

// =============================================================================
// Ensemble plan
// =============================================================================

/// Transformation from summed tree outputs to the final prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputTransform {
    /// Raw sum (regression, ranking).
    Identity,
    /// `exp(sum)` (log-link regression).
    Exp,
    /// `1 / (1 + exp(-sigmoid * sum))`, probability of the second category.
    Logistic { sigmoid: f64 },
    /// Softmax across the per-class sums.
    Softmax,
}

/// Trees whose outputs are summed into one raw output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Output (class) index this segment feeds.
    pub output: usize,
    /// Indices into the model's tree array, in boosting order.
    pub trees: Vec<usize>,
}

/// How the ensemble combines into predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsemblePlan {
    /// Boosting iterations included.
    pub num_iterations: usize,
    pub segments: Vec<Segment>,
    pub transform: OutputTransform,
}

/// Everything an exporter needs to write the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportModel {
    pub algorithm_name: &'static str,
    pub schema: Schema,
    pub ensemble: EnsemblePlan,
}
