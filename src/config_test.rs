use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("KOMUNAL_API_URL");
        std::env::remove_var("KOMUNAL_SESSION_FILE");
        std::env::remove_var("KOMUNAL_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn parse_api_url_defaults() {
    assert_eq!(parse_api_url(None).unwrap(), DEFAULT_API_URL);
}

#[test]
fn parse_api_url_trims_trailing_slash() {
    assert_eq!(parse_api_url(Some("https://komunal.test/api/")).unwrap(), "https://komunal.test/api");
}

#[test]
fn parse_api_url_rejects_other_schemes() {
    let err = parse_api_url(Some("ftp://komunal.test")).unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn with_api_url_overrides() {
    let cfg = ClientConfig::default().with_api_url("http://127.0.0.1:9000/api/").unwrap();
    assert_eq!(cfg.api_url, "http://127.0.0.1:9000/api");
}

#[test]
fn from_env_defaults_and_overrides() {
    unsafe { clear_client_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    assert!(cfg.session_file.ends_with("session.json") || cfg.session_file.ends_with(".komunal-session.json"));

    unsafe {
        std::env::set_var("KOMUNAL_API_URL", "https://komunal.test/api");
        std::env::set_var("KOMUNAL_SESSION_FILE", "/tmp/komunal-test/session.json");
        std::env::set_var("KOMUNAL_CONNECT_TIMEOUT_SECS", "3");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://komunal.test/api");
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/komunal-test/session.json"));
    assert_eq!(cfg.connect_timeout_secs, 3);

    unsafe {
        std::env::set_var("KOMUNAL_CONNECT_TIMEOUT_SECS", "soon");
    }
    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("KOMUNAL_CONNECT_TIMEOUT_SECS"));

    unsafe { clear_client_env() };
}
