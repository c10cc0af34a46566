//! Error types for LightGBM model assembly.

/// Error type for loading a LightGBM text model and deriving its schema.
///
/// Every failure is terminal: assembly either produces a complete model or
/// returns one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("expected section {expected:?}, found {found:?}")]
    MissingSection {
        expected: String,
        found: Option<String>,
    },
    #[error("section {section:?}: missing required key {key:?}")]
    MissingKey { section: String, key: String },
    #[error("section {section:?}: invalid value {value:?} for {key:?}: {message}")]
    MalformedValue {
        section: String,
        key: String,
        value: String,
        message: String,
    },
    #[error("version {0} is not supported")]
    UnsupportedVersion(String),
    #[error("objective {0:?} is not supported")]
    UnsupportedObjective(String),
    #[error("array size mismatch for {field}: expected {expected}, got {actual}")]
    ArrayLengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    #[error("malformed pandas categorical literal: {0:?}")]
    CategoricalLiteralMalformed(String),
    #[error("pandas categorical table has {expected} entries, but {consumed} features consume one")]
    PandasSlotCountMismatch { expected: usize, consumed: usize },
    #[error("feature index {index} out of range (model has {num_features} features)")]
    FeatureIndexOutOfRange { index: usize, num_features: usize },
    #[error("feature {name:?} (index {index}) is both binary and categorical")]
    RoleContradiction { index: usize, name: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    pub(crate) fn malformed(
        section: &str,
        key: &str,
        value: &str,
        message: impl Into<String>,
    ) -> Self {
        ModelError::MalformedValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}
