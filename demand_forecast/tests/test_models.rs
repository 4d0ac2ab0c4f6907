mod common;

use common::weekly_training_set;
use demand_forecast::models::{GradientBoosting, TreeNode};
use demand_forecast::{
    BoostingParams, FeatureMatrix, ForecastError, ForecastModel, Loss, ModelArtifact,
    PointForecaster, QuantileSettings, TrainedForecastModel,
};
use pretty_assertions::assert_eq;

fn small_params() -> BoostingParams {
    BoostingParams {
        n_estimators: 40,
        max_depth: 4,
        ..Default::default()
    }
}

fn fitted_artifact() -> (ModelArtifact, FeatureMatrix) {
    let set = weekly_training_set(100);
    let (train, test) = set.split_fraction(0.8);
    let artifact = ModelArtifact::fit(
        &train.features,
        &train.target,
        small_params(),
        0.9,
        &QuantileSettings::default(),
        11,
    )
    .unwrap();
    (artifact, test.features)
}

#[test]
fn test_band_is_non_negative_and_contains_point() {
    let (artifact, x) = fitted_artifact();
    let band = artifact.predict(&x).unwrap();

    assert_eq!(band.len(), x.n_rows());
    for i in 0..band.len() {
        assert!(band.lower[i] >= 0.0);
        assert!(band.lower[i] <= band.point[i]);
        assert!(band.point[i] <= band.upper[i]);
    }
}

#[test]
fn test_prediction_is_idempotent() {
    let (artifact, x) = fitted_artifact();
    assert_eq!(artifact.predict(&x).unwrap(), artifact.predict(&x).unwrap());
}

#[test]
fn test_reordered_columns_give_same_predictions() {
    let (artifact, x) = fitted_artifact();

    let mut names = x.feature_names().to_vec();
    names.reverse();
    let rows = x
        .rows()
        .iter()
        .map(|row| row.iter().rev().copied().collect())
        .collect();
    let reversed = FeatureMatrix::new(names, rows).unwrap();

    assert_eq!(artifact.predict(&x).unwrap(), artifact.predict(&reversed).unwrap());
}

#[test]
fn test_missing_column_is_rejected() {
    let (artifact, x) = fitted_artifact();

    let names = x.feature_names()[1..].to_vec();
    let rows = x.rows().iter().map(|row| row[1..].to_vec()).collect();
    let truncated = FeatureMatrix::new(names, rows).unwrap();

    match artifact.predict(&truncated).unwrap_err() {
        ForecastError::SchemaMismatch { missing, unexpected } => {
            assert_eq!(missing, vec!["lag_1".to_string()]);
            assert!(unexpected.is_empty());
        }
        other => panic!("Expected SchemaMismatch, got {:?}", other),
    }

    // Future rows are allowed to lack columns; they are zero-filled
    let band = artifact.predict_future(&truncated).unwrap();
    assert_eq!(band.len(), x.n_rows());
}

#[test]
fn test_point_model_clips_negative_output() {
    let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
    let y: Vec<f64> = (0..40).map(|i| if i < 20 { 0.0 } else { 5.0 }).collect();
    let x = FeatureMatrix::new(vec!["step".to_string()], rows).unwrap();
    let model = PointForecaster::new(small_params()).fit(&x, &y).unwrap();

    // Far below the training range the raw model may undershoot; clipped output never does
    let far_left = FeatureMatrix::new(vec!["step".to_string()], vec![vec![-100.0]]).unwrap();
    let clipped = model.predict(&far_left).unwrap();
    let raw = model.predict_raw(&far_left).unwrap();
    assert!(clipped[0] >= 0.0);
    assert_eq!(clipped[0], raw[0].max(0.0));
}

#[test]
fn test_feature_importance_is_normalized_and_sorted() {
    let (artifact, _) = fitted_artifact();
    let ranking = artifact.feature_importance();

    assert_eq!(ranking.len(), artifact.feature_names().len());
    let total: f64 = ranking.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(ranking.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[test]
fn test_trees_respect_max_depth() {
    let set = weekly_training_set(90);
    let params = BoostingParams {
        n_estimators: 10,
        max_depth: 3,
        ..Default::default()
    };
    let learner = GradientBoosting::new(params, Loss::SquaredError);
    let model = learner.train(&set.features, &set.target).unwrap();

    assert_eq!(learner.name(), "gbm-squared-error");
    assert_eq!(model.n_trees(), 10);
    assert!(model.trees().iter().all(|t| t.depth() <= 3));
    assert!(matches!(model.trees()[0].root(), TreeNode::Split { .. }));
}

#[test]
fn test_invalid_params_fail_to_fit() {
    let set = weekly_training_set(90);
    let params = BoostingParams {
        max_depth: 0,
        ..Default::default()
    };
    let err = PointForecaster::new(params)
        .fit(&set.features, &set.target)
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidParameter(_)));
}
