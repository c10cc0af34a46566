//! Export configuration with builder pattern.
//!
//! [`ExportConfig`] controls how an assembled model is described to the
//! document writer. It uses the `bon` crate for builder generation and
//! validates on `build()`.
//!
//! # Example
//!
//! ```
//! use lgbm_export::ExportConfig;
//!
//! // All defaults: target field `_target`, every iteration exported
//! let config = ExportConfig::builder().build().unwrap();
//!
//! let config = ExportConfig::builder()
//!     .target_field("churned")
//!     .target_categories(vec!["no".into(), "yes".into()])
//!     .num_iterations(50)
//!     .build()
//!     .unwrap();
//! ```

use bon::Builder;

/// Default name of the target field.
pub const DEFAULT_TARGET_FIELD: &str = "_target";

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("target_field must not be empty")]
    EmptyTargetField,
    #[error("num_iterations must be at least 1")]
    InvalidNumIterations,
    #[error("target_categories must not be empty")]
    EmptyTargetCategories,
    #[error("target category {0:?} is listed more than once")]
    DuplicateTargetCategory(String),
}

// =============================================================================
// ExportConfig
// =============================================================================

/// Options for [`GbdtModel::encode`](crate::GbdtModel::encode).
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct ExportConfig {
    /// Name of the target field. Default: `_target`.
    #[builder(into, default = DEFAULT_TARGET_FIELD.to_string())]
    pub target_field: String,

    /// Class labels for classification objectives, in class-index order.
    /// `None` labels classes `0..n`.
    pub target_categories: Option<Vec<String>>,

    /// Export only the first `n` boosting iterations. `None` exports all.
    pub num_iterations: Option<usize>,
}

impl<S: export_config_builder::IsComplete> ExportConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty target field, a zero iteration
    /// count, or an empty / duplicated category list.
    pub fn build(self) -> Result<ExportConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.target_field.is_empty() {
            return Err(ConfigError::EmptyTargetField);
        }

        if self.num_iterations == Some(0) {
            return Err(ConfigError::InvalidNumIterations);
        }

        if let Some(categories) = &self.target_categories {
            if categories.is_empty() {
                return Err(ConfigError::EmptyTargetCategories);
            }
            for (i, category) in categories.iter().enumerate() {
                if categories[..i].contains(category) {
                    return Err(ConfigError::DuplicateTargetCategory(category.clone()));
                }
            }
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            target_field: DEFAULT_TARGET_FIELD.to_string(),
            target_categories: None,
            num_iterations: None,
        }
    }
}
