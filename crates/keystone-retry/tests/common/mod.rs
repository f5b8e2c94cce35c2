//! Shared helpers for keystone-retry integration tests

#![allow(dead_code)]

use camino::Utf8PathBuf;
use keystone_retry::RetryPolicy;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Listings endpoint used across HTTP tests
pub const LISTINGS_PATH: &str = "/api/listings";

/// A policy with millisecond delays so real-clock tests stay fast
pub fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts)
        .with_base_delay_ms(1)
        .with_max_delay_ms(10)
}

/// Install a test subscriber once so tracing output shows on failure
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("keystone_retry=debug")
        .with_test_writer()
        .try_init();
}

/// First `fail_count` requests return `fail_status`, later requests return 200
pub async fn mock_flaky_endpoint(server: &MockServer, fail_status: u16, fail_count: u64) {
    Mock::given(method("GET"))
        .and(path(LISTINGS_PATH))
        .respond_with(ResponseTemplate::new(fail_status))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(LISTINGS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(server)
        .await;
}

/// Every request returns `status`
pub async fn mock_failing_endpoint(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(LISTINGS_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of requests the mock server has seen
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

/// URL on localhost where nothing is listening
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, LISTINGS_PATH)
}

/// A temporary config directory, optionally seeded with `retry.yaml`
pub fn config_dir(retry_yaml: Option<&str>) -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    if let Some(content) = retry_yaml {
        std::fs::write(dir.join("retry.yaml"), content).unwrap();
    }
    (temp, dir)
}
