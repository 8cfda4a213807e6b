//! Test helpers for ota-server unit tests.

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use tempfile::TempDir;

use ota_types::ServerConfig;

use crate::middleware::ADMIN_KEY_HEADER;
use crate::router::build_router;
use crate::state::AppState;

pub const TEST_SECRET: &str = "your-device-secret-key";
pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Create an `AppState` backed by a temp data directory.
///
/// Returns `(AppState, TempDir)`; keep `TempDir` alive for the test duration.
pub fn test_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let mut config = ServerConfig::new();
    config.shared_secret_key = TEST_SECRET.to_string();
    config.admin_api_key = TEST_ADMIN_KEY.to_string();
    config.public_base_url = Some("http://ota.test".to_string());

    let state = AppState::from_config(config, temp_dir.path());
    std::fs::create_dir_all(state.firmware().dir()).expect("failed to create firmware dir");

    (state, temp_dir)
}

/// Test server over the full router.
pub fn test_server() -> (TestServer, AppState, TempDir) {
    let (state, temp_dir) = test_app_state();
    let server = TestServer::new(build_router(state.clone())).expect("failed to start test server");
    (server, state, temp_dir)
}

pub fn admin_key_header(key: &'static str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static(ADMIN_KEY_HEADER), HeaderValue::from_static(key))
}
