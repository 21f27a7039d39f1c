//! Unit tests for error formatting.

use contraband_scan::ScanError;

#[test]
fn display_includes_category_and_message() {
    assert_eq!(
        ScanError::Config("bad value".into()).to_string(),
        "config: bad value"
    );
    assert_eq!(
        ScanError::Precondition("subject is gone".into()).to_string(),
        "precondition: subject is gone"
    );
}

#[test]
fn toml_errors_convert_to_config() {
    let parse_err = toml::from_str::<toml::Value>("= nope =").expect_err("invalid toml");
    let err: ScanError = parse_err.into();
    assert!(matches!(err, ScanError::Config(_)));
}

#[test]
fn implements_std_error() {
    let err = ScanError::Precondition("x".into());
    let dynamic: &dyn std::error::Error = &err;
    assert!(dynamic.source().is_none());
}
