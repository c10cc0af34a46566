//! LightGBM text model support.
//!
//! This module lexes LightGBM's text model format, assembles a
//! [`GbdtModel`] from the resulting sections and derives the feature roles
//! an exporter needs.
//!
//! # Format Overview
//!
//! A model file is a sequence of blank-line separated sections. The first
//! line of a section is its identifier; the remaining `key=value` lines are
//! its entries.
//!
//! 1. **Header** (`tree`): version, objective, feature names and infos
//! 2. **Trees** (`Tree=0`, `Tree=1`, ...): split structure and leaf values
//! 3. **Footer**: `end of trees`, feature importances, parameters and the
//!    `pandas_categorical:` literal written by the Python package
//!
//! # Feature Roles
//!
//! LightGBM does not record whether a feature is binary or categorical.
//! Each tree answers with a [`TriState`], the answers are folded into an
//! ensemble consensus and reconciled against the declared feature info.
//!
//! # Example
//!
//! ```no_run
//! use lgbm_export::{ExportConfig, GbdtModel};
//!
//! let model = GbdtModel::from_file("model.txt")?;
//! let export = model.encode(&ExportConfig::default())?;
//! println!("{}", serde_json::to_string_pretty(&export).unwrap());
//! # Ok::<(), lgbm_export::ModelError>(())
//! ```

pub mod consensus;
pub mod feature_info;
pub mod model;
pub mod objective;
pub mod pandas;
pub mod role;
pub mod section;
pub mod tree;

pub use consensus::TriState;
pub use feature_info::{FeatureInfo, InfoShape};
pub use model::GbdtModel;
pub use objective::ObjectiveFunction;
pub use pandas::parse_pandas_categorical;
pub use role::{reconcile, FeatureRole, RoleConflict};
pub use section::{parse_sections, Section};
pub use tree::{DecisionType, Tree};
