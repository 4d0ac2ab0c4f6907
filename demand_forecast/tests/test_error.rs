use demand_forecast::error::{ForecastError, PipelineStage};
use std::error::Error;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    match ForecastError::from(io_error) {
        ForecastError::IoError(_) => {}
        other => panic!("Expected IoError variant, got {:?}", other),
    }

    let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    match ForecastError::from(json_error) {
        ForecastError::JsonError(_) => {}
        other => panic!("Expected JsonError variant, got {:?}", other),
    }

    let math_error = demand_math::RollingWindow::new(0).unwrap_err();
    match ForecastError::from(math_error) {
        ForecastError::MathError(_) => {}
        other => panic!("Expected MathError variant, got {:?}", other),
    }
}

#[test]
fn test_error_display() {
    let error =
        ForecastError::InvalidParameter("horizon_days must be between 7 and 60".to_string());
    assert!(error.to_string().contains("horizon_days must be between 7 and 60"));

    let error = ForecastError::SchemaMismatch {
        missing: vec!["lag_7".to_string()],
        unexpected: vec!["extra".to_string()],
    };
    let message = error.to_string();
    assert!(message.contains("lag_7"));
    assert!(message.contains("extra"));
}

#[test]
fn test_stage_wrapping() {
    let error = ForecastError::InsufficientHistory {
        required: 50,
        available: 12,
    }
    .at_stage(PipelineStage::FeatureConstruction);

    assert_eq!(error.stage(), Some(PipelineStage::FeatureConstruction));
    assert!(error.is_insufficient_history());
    assert!(error.source().is_some());
    assert_eq!(
        error.to_string(),
        "Forecast failed during feature construction: Insufficient history: 12 clean rows after dropping incomplete lags, at least 50 required"
    );

    // An error that already names its stage keeps it
    let rewrapped = error.at_stage(PipelineStage::Prediction);
    assert_eq!(rewrapped.stage(), Some(PipelineStage::FeatureConstruction));
}

#[test]
fn test_root_cause() {
    let error =
        ForecastError::TrainingError("diverged".to_string()).at_stage(PipelineStage::Fitting);
    assert!(matches!(error.root_cause(), ForecastError::TrainingError(_)));
    assert!(!error.is_insufficient_history());
    assert_eq!(PipelineStage::Optimization.to_string(), "hyperparameter optimization");
}
