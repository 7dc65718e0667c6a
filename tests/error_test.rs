//! Tests for error types

use trueno_track::Error;

#[test]
fn test_run_not_found_error() {
    let error = Error::RunNotFound("a1b2c3".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Run not found"));
    assert!(error_str.contains("a1b2c3"));
    assert!(error_str.contains("repository location"));
}

#[test]
fn test_run_closed_error() {
    let error = Error::RunClosed("a1b2c3".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("a1b2c3 is closed"));
    assert!(error_str.contains("resuming"));
}

#[test]
fn test_adapter_closed_error() {
    let error_str = format!("{}", Error::AdapterClosed);
    assert!(error_str.contains("torn down"));
}

#[test]
fn test_invalid_metric_error() {
    let error = Error::InvalidMetric {
        name: "train_loss".to_string(),
        reason: "non-finite value NaN".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid metric 'train_loss'"));
    assert!(error_str.contains("NaN"));
}

#[test]
fn test_invalid_param_error() {
    let error = Error::InvalidParam {
        key: "Learner.loss_func".to_string(),
        reason: "object has no JSON form".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("'Learner.loss_func'"));
}

#[test]
fn test_parse_error() {
    let error = Error::ParseError("unexpected EOF".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("SQL parse error"));
    assert!(error_str.contains("unexpected EOF"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("file not found".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    let error_str = format!("{error}");
    assert_eq!(error_str, "custom error message");
}

#[test]
fn test_error_debug() {
    let debug_str = format!("{:?}", Error::AdapterClosed);
    assert!(debug_str.contains("AdapterClosed"));
}

#[test]
fn test_result_type_alias_error() {
    fn returns_error() -> trueno_track::Result<i32> {
        Err(Error::Other("test error".to_string()))
    }

    let result = returns_error();
    assert!(result.is_err());
}
