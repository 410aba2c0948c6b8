use satchel_util::errors::SatchelError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = SatchelError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_config_error_display() {
    let err = SatchelError::Config {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Config error: bad syntax");
}

#[test]
fn test_lockfile_error_display() {
    let err = SatchelError::Lockfile {
        message: "truncated".to_string(),
    };
    assert_eq!(err.to_string(), "Lockfile error: truncated");
}

#[test]
fn test_generic_error_display() {
    let err = SatchelError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let satchel_err: SatchelError = io_err.into();
    matches!(satchel_err, SatchelError::Io(_));
}
