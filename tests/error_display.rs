use std::time::Duration;

use pagesnap_lib::{CaptureError, ErrorCategory};

#[test]
fn config_error_display_includes_message() {
    let err = CaptureError::Config("fetch.timeout must be greater than zero".to_string());

    assert_eq!(
        format!("{}", err),
        "Configuration error: fetch.timeout must be greater than zero"
    );
}

#[test]
fn invalid_url_display_names_input_and_reason() {
    let err = CaptureError::invalid_url("https://", "URL has no host");

    assert_eq!(format!("{}", err), "Invalid URL 'https://': URL has no host");
}

#[test]
fn directory_create_display_wraps_source() {
    let err = CaptureError::DirectoryCreate {
        path: "outputs/2024-03-09_14-05-07_example_com".into(),
        source: std::io::Error::other("disk full"),
    };
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("Failed to create output directory outputs/"));
    assert!(rendered.contains("disk full"));
    assert_eq!(err.to_info().category, ErrorCategory::Filesystem);
}

#[test]
fn artifact_write_display_includes_path() {
    let err = CaptureError::artifact_write(
        "outputs/s/s.jpg",
        std::io::Error::other("read-only file system"),
    );
    let rendered = format!("{}", err);

    assert!(rendered.contains("outputs/s/s.jpg"));
    assert!(rendered.contains("read-only file system"));
}

#[test]
fn timeout_info_points_at_deadline_flag() {
    let info = CaptureError::Timeout(Duration::from_secs(120)).to_info();

    assert_eq!(info.category, ErrorCategory::Timeout);
    assert!(info.remediation.unwrap().contains("--render-deadline"));
}

#[test]
fn launch_failure_info_points_at_chrome_flag() {
    let info = CaptureError::render("failed to launch browser: not found").to_info();

    assert_eq!(info.category, ErrorCategory::Render);
    assert!(info.remediation.unwrap().contains("--chrome"));
}
