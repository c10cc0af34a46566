//! Fixture loading utilities for integration tests.
//!
//! For building model text inline, use `lgbm_export::testing`.

#![allow(dead_code)]

use std::path::PathBuf;

use lgbm_export::GbdtModel;

/// Base directory for test cases.
pub fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/test-cases")
}

/// Directory for LightGBM test cases.
pub fn lightgbm_test_cases_dir() -> PathBuf {
    test_cases_dir().join("lightgbm")
}

/// Path of the `model.txt` fixture in test case `name`.
pub fn lightgbm_model_path(name: &str) -> PathBuf {
    lightgbm_test_cases_dir().join(name).join("model.txt")
}

/// Load the `model.txt` fixture of test case `name`.
pub fn load_lightgbm_model(name: &str) -> GbdtModel {
    let path = lightgbm_model_path(name);
    GbdtModel::from_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {e}", path.display()))
}
