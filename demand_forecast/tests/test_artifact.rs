mod common;

use common::weekly_training_set;
use demand_forecast::{BoostingParams, ForecastError, ModelArtifact, QuantileSettings};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn artifact() -> (ModelArtifact, demand_forecast::FeatureMatrix) {
    let set = weekly_training_set(90);
    let (train, test) = set.split_fraction(0.8);
    let params = BoostingParams {
        n_estimators: 30,
        max_depth: 3,
        subsample: 0.8,
        ..Default::default()
    };
    let artifact = ModelArtifact::fit(
        &train.features,
        &train.target,
        params,
        0.95,
        &QuantileSettings::default(),
        5,
    )
    .unwrap();
    (artifact, test.features)
}

#[test]
fn test_file_round_trip_predicts_identically() {
    let (artifact, x) = artifact();
    let dir = tempdir().unwrap();
    let path = dir.path().join("artifact.json");

    artifact.save(&path).unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();

    assert_eq!(loaded.feature_names(), artifact.feature_names());
    assert_eq!(loaded.params(), artifact.params());
    assert_eq!(loaded.seed(), 5);
    assert_eq!(loaded.predict(&x).unwrap(), artifact.predict(&x).unwrap());
}

#[test]
fn test_metadata() {
    let (artifact, _) = artifact();
    assert_eq!(artifact.confidence_level(), 0.95);
    assert_eq!(artifact.params().n_estimators, 30);
    // Quantile models use max(50, 30 / 2) trees
    assert_eq!(artifact.interval_model().lower_model().n_trees(), 50);
    assert_eq!(artifact.point_model().booster().n_trees(), 30);
}

#[test]
fn test_load_missing_file_fails() {
    let dir = tempdir().unwrap();
    let err = ModelArtifact::load(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ForecastError::IoError(_)));
}

#[test]
fn test_corrupt_json_fails() {
    let err = ModelArtifact::from_json_str("{\"point\": 1}").unwrap_err();
    assert!(matches!(err, ForecastError::JsonError(_)));
}

#[test]
fn test_saved_file_holds_complete_json() {
    let (artifact, x) = artifact();
    let dir = tempdir().unwrap();
    let path = dir.path().join("artifact.json");

    artifact.save(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();

    // Larger than the writer's buffer, so the tail only lands on flush
    assert!(written.len() > 8 * 1024);
    assert_eq!(written, artifact.to_json_string().unwrap());
    let reloaded = ModelArtifact::from_json_str(&written).unwrap();
    assert_eq!(reloaded.predict(&x).unwrap(), artifact.predict(&x).unwrap());
}
