//! Integration tests for schema and ensemble export.

mod common;

use approx::assert_relative_eq;
use lgbm_export::testing::ModelTextBuilder;
use lgbm_export::{
    CategorySource, ConfigError, DataType, ExportConfig, FeatureKind, GbdtModel,
    InvalidValueTreatment, Label, ModelError, OutputTransform, Value,
};
use serde_json::json;

use common::load_lightgbm_model;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

mod regression {
    use super::*;

    #[test]
    fn exports_feature_kinds() {
        let model = load_lightgbm_model("regression");
        let export = model.encode(&ExportConfig::default()).unwrap();

        assert_eq!(export.algorithm_name, "LightGBM");
        assert_eq!(export.schema.label.name(), "_target");
        assert_eq!(export.schema.features.len(), 4);
        assert!(export.schema.features[2].is_none());
        assert_eq!(export.schema.active_features().count(), 3);

        let x0 = export.schema.feature("x0").unwrap();
        let FeatureKind::Continuous { interval: Some(interval) } = &x0.kind else {
            panic!("expected continuous with interval, got {:?}", x0.kind);
        };
        assert_relative_eq!(interval.left, -2.5);
        assert_relative_eq!(interval.right, 3.1);
        assert_eq!(x0.invalid_value_treatment, InvalidValueTreatment::AsIs);
        assert_eq!(x0.importance, Some(2.0));

        assert!(export.schema.feature("flag").unwrap().is_binary());

        let color = export.schema.feature("color").unwrap();
        assert_eq!(color.index, 3);
        assert_eq!(
            color.kind,
            FeatureKind::Categorical {
                data_type: DataType::Integer,
                values: (0..4).map(Value::Integer).collect(),
                source: CategorySource::FeatureInfo,
            }
        );
        assert_eq!(color.invalid_value_treatment, InvalidValueTreatment::AsMissing);
    }

    #[test]
    fn exports_single_segment() {
        let model = load_lightgbm_model("regression");
        let export = model.encode(&ExportConfig::default()).unwrap();

        assert_eq!(export.ensemble.num_iterations, 3);
        assert_eq!(export.ensemble.transform, OutputTransform::Identity);
        assert_eq!(export.ensemble.segments.len(), 1);
        assert_eq!(export.ensemble.segments[0].trees, vec![0, 1, 2]);
    }

    #[test]
    fn limits_iterations() {
        let model = load_lightgbm_model("regression");
        let config = ExportConfig::builder().num_iterations(2).build().unwrap();
        let export = model.encode(&config).unwrap();

        assert_eq!(export.ensemble.num_iterations, 2);
        assert_eq!(export.ensemble.segments[0].trees, vec![0, 1]);
    }

    #[test]
    fn serializes_to_json() {
        let model = load_lightgbm_model("regression");
        let config = ExportConfig::builder().target_field("price").build().unwrap();
        let value = serde_json::to_value(model.encode(&config).unwrap()).unwrap();

        assert_eq!(value["algorithm_name"], json!("LightGBM"));
        assert_eq!(
            value["schema"]["label"],
            json!({ "type": "continuous", "name": "price", "data_type": "double" })
        );
        assert_eq!(value["schema"]["features"][1]["kind"], json!({ "type": "binary" }));
        assert_eq!(value["schema"]["features"][2], json!(null));
        assert_eq!(
            value["schema"]["features"][3]["kind"],
            json!({
                "type": "categorical",
                "data_type": "integer",
                "values": [0, 1, 2, 3],
                "source": "feature_info",
            })
        );
        assert_eq!(value["ensemble"]["transform"], json!({ "type": "identity" }));
    }
}

mod binary_classification {
    use super::*;

    #[test]
    fn pandas_labels_replace_codes() {
        let model = load_lightgbm_model("binary_classification");
        let schema = model.encode_schema("churned", None).unwrap();

        assert_eq!(
            schema.feature("city").unwrap().kind,
            FeatureKind::Categorical {
                data_type: DataType::String,
                values: vec![Value::from("berlin"), Value::from("oslo"), Value::from("rome")],
                source: CategorySource::Pandas,
            }
        );
        assert_eq!(
            schema.feature("plan").unwrap().kind,
            FeatureKind::Categorical {
                data_type: DataType::String,
                values: vec![Value::from("basic"), Value::from("pro")],
                source: CategorySource::Pandas,
            }
        );
        assert!(schema.feature("is_member").unwrap().is_binary());
        assert!(schema.feature("age").unwrap().is_continuous());
    }

    #[test]
    fn labels_use_target_categories() {
        let model = load_lightgbm_model("binary_classification");
        let config = ExportConfig::builder()
            .target_field("churned")
            .target_categories(strings(&["no", "yes"]))
            .build()
            .unwrap();
        let export = model.encode(&config).unwrap();

        assert_eq!(
            export.schema.label,
            Label::Categorical {
                name: "churned".to_string(),
                data_type: DataType::String,
                values: vec![Value::from("no"), Value::from("yes")],
            }
        );
        assert_eq!(
            export.ensemble.transform,
            OutputTransform::Logistic { sigmoid: 1.0 }
        );
    }

    #[test]
    fn default_labels_are_class_indices() {
        let model = load_lightgbm_model("binary_classification");
        let export = model.encode(&ExportConfig::default()).unwrap();

        assert_eq!(
            export.schema.label,
            Label::Categorical {
                name: "_target".to_string(),
                data_type: DataType::Integer,
                values: vec![Value::Integer(0), Value::Integer(1)],
            }
        );
    }

    #[test]
    fn wrong_category_count_fails() {
        let model = load_lightgbm_model("binary_classification");
        let config = ExportConfig::builder()
            .target_categories(strings(&["a", "b", "c"]))
            .build()
            .unwrap();
        let err = model.encode(&config).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ArrayLengthMismatch { expected: 2, actual: 3, .. }
        ));
    }
}

mod multiclass {
    use super::*;

    #[test]
    fn one_segment_per_class() {
        let model = load_lightgbm_model("multiclass");
        let config = ExportConfig::builder()
            .target_field("species")
            .target_categories(strings(&["setosa", "versicolor", "virginica"]))
            .build()
            .unwrap();
        let export = model.encode(&config).unwrap();

        assert_eq!(export.ensemble.transform, OutputTransform::Softmax);
        assert_eq!(export.ensemble.num_iterations, 2);
        let trees: Vec<Vec<usize>> = export
            .ensemble
            .segments
            .iter()
            .map(|segment| segment.trees.clone())
            .collect();
        assert_eq!(trees, vec![vec![0, 3], vec![1, 4], vec![2, 5]]);
        assert_eq!(export.ensemble.segments[2].output, 2);
    }

    #[test]
    fn first_iteration_only() {
        let model = load_lightgbm_model("multiclass");
        let config = ExportConfig::builder().num_iterations(1).build().unwrap();
        let export = model.encode(&config).unwrap();

        assert_eq!(export.ensemble.num_iterations, 1);
        assert!(export
            .ensemble
            .segments
            .iter()
            .enumerate()
            .all(|(class, segment)| segment.trees == vec![class]));
    }

    #[test]
    fn importance_is_optional() {
        let model = load_lightgbm_model("multiclass");
        let schema = model.encode_schema("species", None).unwrap();

        assert_eq!(schema.feature("petal_length").unwrap().importance, Some(3.0));
        assert_eq!(schema.feature("sepal_width").unwrap().importance, None);
    }
}

mod pandas {
    use super::*;

    #[test]
    fn numeric_labels_are_typed() {
        let table = vec![strings(&["0.5", "1.5"]), strings(&["10", "20"])];
        let text = ModelTextBuilder::regression(&["ratio", "size"], &["0:1", "0:1"])
            .end_of_trees()
            .pandas_categorical(&table)
            .build();
        let model = GbdtModel::from_string(&text).unwrap();
        let schema = model.encode_schema("y", None).unwrap();

        assert_eq!(
            schema.feature("ratio").unwrap().kind,
            FeatureKind::Categorical {
                data_type: DataType::Double,
                values: vec![Value::Double(0.5), Value::Double(1.5)],
                source: CategorySource::Pandas,
            }
        );
        assert_eq!(
            schema.feature("size").unwrap().kind,
            FeatureKind::Categorical {
                data_type: DataType::Integer,
                values: vec![Value::Integer(10), Value::Integer(20)],
                source: CategorySource::Pandas,
            }
        );
    }

    #[test]
    fn two_entries_one_categorical_feature() {
        let table = vec![strings(&["a", "b"]), strings(&["c"])];
        let text = ModelTextBuilder::regression(&["cat", "num"], &["0:1", "[0:5]"])
            .tree(ModelTextBuilder::numeric_split(1, 2.5))
            .end_of_trees()
            .pandas_categorical(&table)
            .build();
        let model = GbdtModel::from_string(&text).unwrap();
        let err = model.encode_schema("y", None).unwrap_err();

        assert!(matches!(
            err,
            ModelError::PandasSlotCountMismatch { expected: 2, consumed: 1 }
        ));
    }
}

mod config {
    use super::*;

    #[test]
    fn invalid_config_is_rejected_before_export() {
        let err = ExportConfig::builder()
            .target_categories(strings(&["x", "x"]))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateTargetCategory("x".to_string()));
    }
}
