//! Objective functions.
//!
//! The objective decides how the target field is typed and how summed tree
//! outputs turn into a prediction. Only the objectives whose prediction
//! function can be expressed as a sum of trees followed by a fixed link are
//! supported.

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::schema::{DataType, EnsemblePlan, Label, OutputTransform, Segment, Value};

use super::section::Section;

/// Training objective of a LightGBM model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectiveFunction {
    /// L2, L1, Huber and Fair losses (identity link).
    Regression,
    /// Poisson, Gamma and Tweedie losses (log link).
    PoissonRegression,
    Lambdarank,
    BinomialLogisticRegression { sigmoid: f64 },
    MultinomialLogisticRegression { class_count: usize },
}

impl ObjectiveFunction {
    /// Resolve the objective from the header section.
    ///
    /// The `objective` value is a token list such as `binary sigmoid:1`.
    /// Tokens after the first are `key:value` parameters that take
    /// precedence over same-named header keys.
    pub fn load(section: &Section) -> Result<Self> {
        let tokens = section.get_string_array("objective", None)?;
        let (name, params) = tokens
            .split_first()
            .ok_or_else(|| ModelError::MissingKey {
                section: section.id().to_string(),
                key: "objective".to_string(),
            })?;

        if params.is_empty() {
            return Self::from_name(name, section);
        }

        let mut section = section.clone();
        for param in params {
            section.put_token(param, ':')?;
        }
        Self::from_name(name, &section)
    }

    /// Map an objective name (or one of its aliases) to a variant, reading
    /// variant parameters from `section`.
    pub fn from_name(name: &str, section: &Section) -> Result<Self> {
        let objective = match name {
            "regression" | "regression_l2" | "mean_squared_error" | "mse" | "regression_l1"
            | "mean_absolute_error" | "mae" | "huber" | "fair" => ObjectiveFunction::Regression,
            "poisson" | "gamma" | "tweedie" => ObjectiveFunction::PoissonRegression,
            "lambdarank" => ObjectiveFunction::Lambdarank,
            "binary" => ObjectiveFunction::BinomialLogisticRegression {
                sigmoid: section.get_double("sigmoid")?,
            },
            "multiclass" => {
                let num_class = section.get_int("num_class")?;
                let class_count = usize::try_from(num_class)
                    .ok()
                    .filter(|&n| n >= 2)
                    .ok_or_else(|| {
                        ModelError::malformed(
                            section.id(),
                            "num_class",
                            &num_class.to_string(),
                            "multiclass needs at least two classes",
                        )
                    })?;
                ObjectiveFunction::MultinomialLogisticRegression { class_count }
            }
            other => return Err(ModelError::UnsupportedObjective(other.to_string())),
        };

        debug!(objective_name = name, ?objective, "resolved objective function");
        Ok(objective)
    }

    /// Trees added per boosting iteration.
    pub fn trees_per_iteration(&self) -> usize {
        match self {
            ObjectiveFunction::Regression
            | ObjectiveFunction::PoissonRegression
            | ObjectiveFunction::Lambdarank
            | ObjectiveFunction::BinomialLogisticRegression { .. } => 1,
            ObjectiveFunction::MultinomialLogisticRegression { class_count } => *class_count,
        }
    }

    /// Describe the target field.
    ///
    /// For the logistic variants `target_categories`, when given, must list
    /// exactly one label per class; otherwise the classes are `0..n`.
    pub fn encode_label(
        &self,
        target_field: &str,
        target_categories: Option<&[String]>,
    ) -> Result<Label> {
        let continuous = || Label::Continuous {
            name: target_field.to_string(),
            data_type: DataType::Double,
        };

        match self {
            ObjectiveFunction::Regression => Ok(continuous()),
            ObjectiveFunction::PoissonRegression => Ok(continuous()),
            ObjectiveFunction::Lambdarank => Ok(continuous()),
            ObjectiveFunction::BinomialLogisticRegression { .. } => {
                categorical_label(target_field, target_categories, 2)
            }
            ObjectiveFunction::MultinomialLogisticRegression { class_count } => {
                categorical_label(target_field, target_categories, *class_count)
            }
        }
    }

    /// Group trees into summed segments and pick the output link.
    ///
    /// `num_iterations` limits the export to the first boosting iterations;
    /// values beyond the ensemble size export every tree.
    pub fn encode_ensemble(&self, num_trees: usize, num_iterations: Option<usize>) -> EnsemblePlan {
        let per_iteration = self.trees_per_iteration();
        let available = num_trees.div_ceil(per_iteration);
        let num_iterations = num_iterations.map_or(available, |n| n.min(available));
        let used = (num_iterations * per_iteration).min(num_trees);

        let single = || {
            vec![Segment {
                output: 0,
                trees: (0..used).collect(),
            }]
        };

        let (segments, transform) = match self {
            ObjectiveFunction::Regression => (single(), OutputTransform::Identity),
            ObjectiveFunction::PoissonRegression => (single(), OutputTransform::Exp),
            ObjectiveFunction::Lambdarank => (single(), OutputTransform::Identity),
            ObjectiveFunction::BinomialLogisticRegression { sigmoid } => {
                (single(), OutputTransform::Logistic { sigmoid: *sigmoid })
            }
            ObjectiveFunction::MultinomialLogisticRegression { class_count } => {
                let segments = (0..*class_count)
                    .map(|class| Segment {
                        output: class,
                        trees: (class..used).step_by(*class_count).collect(),
                    })
                    .collect();
                (segments, OutputTransform::Softmax)
            }
        };

        EnsemblePlan {
            num_iterations,
            segments,
            transform,
        }
    }
}

fn categorical_label(
    target_field: &str,
    target_categories: Option<&[String]>,
    count: usize,
) -> Result<Label> {
    let (data_type, values) = match target_categories {
        Some(categories) => {
            if categories.len() != count {
                return Err(ModelError::ArrayLengthMismatch {
                    field: "target_categories".to_string(),
                    expected: count,
                    actual: categories.len(),
                });
            }
            let values = categories.iter().map(|c| Value::String(c.clone())).collect();
            (DataType::String, values)
        }
        None => {
            let values = (0..count as i64).map(Value::Integer).collect();
            (DataType::Integer, values)
        }
    };

    Ok(Label::Categorical {
        name: target_field.to_string(),
        data_type,
        values,
    })
}
