mod common;
use common::ENV_LOCK;

use restfeed::{ClientConfig, FetchErrorKind};

fn clear_env() {
    for key in [
        "RESTFEED_ERROR_FLAGS",
        "RESTFEED_TIMEOUT_MS",
        "RESTFEED_CONNECT_TIMEOUT_MS",
        "RESTFEED_MAX_PAGES",
    ] {
        std::env::remove_var(key);
    }
}

#[tokio::test]
async fn from_env_uses_defaults_when_unset() {
    let _guard = ENV_LOCK.lock().await;
    clear_env();

    let config = ClientConfig::from_env().expect("config");
    assert_eq!(config, ClientConfig::default());
}

#[tokio::test]
async fn from_env_reads_flags_and_limits() {
    let _guard = ENV_LOCK.lock().await;
    clear_env();
    std::env::set_var("RESTFEED_ERROR_FLAGS", "detail,non_field_errors");
    std::env::set_var("RESTFEED_TIMEOUT_MS", "0");
    std::env::set_var("RESTFEED_MAX_PAGES", "5");

    let config = ClientConfig::from_env().expect("config");
    clear_env();

    assert_eq!(config.error_flags, vec!["detail", "non_field_errors"]);
    assert_eq!(config.timeout_ms, None);
    assert_eq!(config.max_pages, Some(5));
}

#[tokio::test]
async fn from_env_rejects_invalid_numbers() {
    let _guard = ENV_LOCK.lock().await;
    clear_env();
    std::env::set_var("RESTFEED_CONNECT_TIMEOUT_MS", "soon");

    let err = ClientConfig::from_env().unwrap_err();
    clear_env();

    assert_eq!(err.kind, FetchErrorKind::Config);
    assert!(err.message.contains("RESTFEED_CONNECT_TIMEOUT_MS"));
}
