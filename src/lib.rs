//! lgbm-export: LightGBM text models, described for export.
//!
//! Parses LightGBM's text model format into a typed model and derives
//! everything a document writer needs to emit it: the label, the role of
//! every feature and the grouping of trees into summed outputs.
//!
//! # Key Types
//!
//! - [`GbdtModel`] - Assembled model with feature role queries
//! - [`ExportConfig`] - Export options builder
//! - [`ExportModel`] / [`Schema`] - Serializable export description
//! - [`ObjectiveFunction`] - Supported training objectives
//!
//! # Loading
//!
//! Use [`GbdtModel::from_file`] or [`GbdtModel::from_string`], then
//! [`GbdtModel::encode`]. See the [`lightgbm`] module for format details.

pub mod config;
pub mod error;
pub mod lightgbm;
pub mod schema;
pub mod testing;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use config::{ConfigError, ExportConfig};
pub use error::{ModelError, Result};

pub use lightgbm::{
    parse_sections, FeatureRole, GbdtModel, ObjectiveFunction, Section, Tree, TriState,
};

pub use schema::{
    CategorySource, DataType, EnsemblePlan, ExportModel, Feature, FeatureKind,
    InvalidValueTreatment, Label, OutputTransform, Schema, Segment, Value,
};
