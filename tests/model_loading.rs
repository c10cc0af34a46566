//! Integration tests for assembling LightGBM text models.
//!
//! These tests load fixture models written by LightGBM and check the
//! assembled header, tree sequence, footer sections and feature roles.

mod common;

use std::io::Write;

use approx::assert_relative_eq;
use lgbm_export::testing::ModelTextBuilder;
use lgbm_export::{FeatureRole, GbdtModel, ModelError, ObjectiveFunction, TriState};

use common::{lightgbm_model_path, load_lightgbm_model};

mod regression {
    use super::*;

    #[test]
    fn loads_header() {
        let model = load_lightgbm_model("regression");

        assert_eq!(model.version(), Some("v3"));
        assert_eq!(model.max_feature_idx(), 3);
        assert_eq!(model.num_features(), 4);
        assert_eq!(model.label_index(), 0);
        assert_eq!(model.feature_names(), &["x0", "flag", "unused", "color"]);
        assert_eq!(model.feature_infos()[2], "none");
        assert_eq!(*model.objective(), ObjectiveFunction::Regression);
        assert!(!model.boost_from_average());
    }

    #[test]
    fn loads_all_trees() {
        let model = load_lightgbm_model("regression");

        assert_eq!(model.num_trees(), 3);
        let trees = model.trees();
        assert_eq!(trees[0].num_splits(), 2);
        assert_eq!(trees[1].categories_left(0), Some(vec![1, 3]));
        assert_eq!(trees[2].num_splits(), 0);
        assert_relative_eq!(trees[2].leaf_value[0], 0.0123);
        assert_relative_eq!(trees[1].shrinkage, 0.1);
    }

    #[test]
    fn loads_footer() {
        let model = load_lightgbm_model("regression");

        assert_eq!(model.feature_importance("x0").unwrap(), Some(2.0));
        assert_eq!(model.feature_importance("flag").unwrap(), Some(1.0));
        assert_eq!(model.feature_importance("unused").unwrap(), None);
        assert!(model.pandas_categorical().is_empty());
    }

    #[test]
    fn reconciles_roles() {
        let model = load_lightgbm_model("regression");

        assert_eq!(model.binary_consensus(1), TriState::True);
        assert_eq!(model.categorical_consensus(3), TriState::True);
        assert_eq!(model.binary_consensus(0), TriState::False);
        assert_eq!(
            model.feature_roles().unwrap(),
            vec![
                FeatureRole::Continuous,
                FeatureRole::Binary,
                FeatureRole::Unused,
                FeatureRole::Categorical,
            ]
        );
    }
}

mod binary_classification {
    use super::*;

    #[test]
    fn reads_inline_sigmoid() {
        let model = load_lightgbm_model("binary_classification");
        assert_eq!(
            *model.objective(),
            ObjectiveFunction::BinomialLogisticRegression { sigmoid: 1.0 }
        );
    }

    #[test]
    fn reads_pandas_table() {
        let model = load_lightgbm_model("binary_classification");
        assert_eq!(
            model.pandas_categorical(),
            &[
                vec!["berlin".to_string(), "oslo".to_string(), "rome".to_string()],
                vec!["basic".to_string(), "pro".to_string()],
            ]
        );
    }

    #[test]
    fn reconciles_roles() {
        let model = load_lightgbm_model("binary_classification");
        assert_eq!(
            model.feature_roles().unwrap(),
            vec![
                FeatureRole::Continuous,
                FeatureRole::Binary,
                FeatureRole::Categorical,
                FeatureRole::Categorical,
            ]
        );
    }
}

mod multiclass {
    use super::*;

    #[test]
    fn loads_interleaved_trees() {
        let model = load_lightgbm_model("multiclass");

        assert_eq!(
            *model.objective(),
            ObjectiveFunction::MultinomialLogisticRegression { class_count: 3 }
        );
        assert_eq!(model.objective().trees_per_iteration(), 3);
        assert_eq!(model.num_trees(), 6);
        assert!(model
            .feature_roles()
            .unwrap()
            .iter()
            .all(|role| *role == FeatureRole::Continuous));
    }
}

mod sections {
    use super::*;

    #[test]
    fn end_of_parameters_directly_after_parameter_lines() {
        let text = "tree\nversion=v3\nmax_feature_idx=0\nlabel_index=0\nobjective=regression\n\
                    feature_names=a\nfeature_infos=[0:1]\n\n\
                    end of trees\n\n\
                    parameters:\n[boosting: gbdt]\nend of parameters\n\n\
                    pandas_categorical:[[\"x\"]]\n";
        let model = GbdtModel::from_string(text).unwrap();
        assert_eq!(model.num_trees(), 0);
        assert_eq!(model.pandas_categorical().len(), 1);
    }

    #[test]
    fn legacy_importance_identifier() {
        let text = ModelTextBuilder::regression(&["a"], &["[0:10]"])
            .end_of_trees()
            .raw_section("feature importances:\na=7")
            .build();
        let model = GbdtModel::from_string(&text).unwrap();
        assert_eq!(model.feature_importance("a").unwrap(), Some(7.0));
    }

    #[test]
    fn objective_parameters_override_header_keys() {
        let text = ModelTextBuilder::regression(&["a"], &["[0:10]"])
            .header_entry("sigmoid", "1")
            .objective("binary sigmoid:0.5")
            .build();
        let model = GbdtModel::from_string(&text).unwrap();
        assert_eq!(
            *model.objective(),
            ObjectiveFunction::BinomialLogisticRegression { sigmoid: 0.5 }
        );
    }

    #[test]
    fn boost_from_average_flag() {
        let text = ModelTextBuilder::regression(&["a"], &["[0:10]"])
            .boost_from_average()
            .build();
        let model = GbdtModel::from_string(&text).unwrap();
        assert!(model.boost_from_average());
    }

    #[test]
    fn crlf_file_loads() {
        let text = ModelTextBuilder::regression(&["a", "b"], &["[0:10]", "[0:1]"])
            .tree(ModelTextBuilder::numeric_split(0, 3.5))
            .tree(ModelTextBuilder::binary_split(1))
            .end_of_trees()
            .build()
            .replace('\n', "\r\n");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let model = GbdtModel::from_file(file.path()).unwrap();
        assert_eq!(model.num_trees(), 2);
        assert_eq!(model.feature_role(1).unwrap(), FeatureRole::Binary);
    }
}

mod errors {
    use super::*;

    #[test]
    fn missing_file() {
        let err = GbdtModel::from_file(lightgbm_model_path("does_not_exist")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn unsupported_objective() {
        let text = ModelTextBuilder::regression(&["a"], &["[0:10]"])
            .objective("quantile alpha:0.9")
            .build();
        let err = GbdtModel::from_string(&text).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedObjective(ref name) if name == "quantile"));
    }

    #[test]
    fn malformed_tree_is_reported() {
        let text = ModelTextBuilder::regression(&["a"], &["[0:10]"])
            .tree("num_leaves=two".to_string())
            .build();
        let err = GbdtModel::from_string(&text).unwrap_err();
        assert!(matches!(err, ModelError::MalformedValue { ref key, .. } if key == "num_leaves"));
    }

    #[test]
    fn malformed_pandas_literal() {
        let text = ModelTextBuilder::regression(&["a"], &["0:1"])
            .end_of_trees()
            .raw_section("pandas_categorical:[[\"a\"")
            .build();
        let err = GbdtModel::from_string(&text).unwrap_err();
        assert!(matches!(err, ModelError::CategoricalLiteralMalformed(_)));
    }
}
