// Common test utilities for integration tests

use std::time::Duration;

use serde_json::json;
use wiremock::MockServer;

use bindsync::{Auth, HttpDirectoryClient};

/// Initialize tracing for test output, once per process.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "bindsync=debug".into()),
            )
            .with_test_writer()
            .init();
    });
}

/// Build a client pointed at a mock directory, with a short timeout.
pub fn client_for(server: &MockServer) -> HttpDirectoryClient {
    HttpDirectoryClient::new(&server.uri(), Auth::None, Duration::from_secs(5))
        .expect("client construction")
}

/// A directory record body as the API reports it.
pub fn record_body(name: &str, rtype: &str, ttl: u32, rdata: &str) -> serde_json::Value {
    json!({
        "name": name,
        "type": rtype,
        "ttl": ttl,
        "class": "IN",
        "rdata": rdata,
        "zone": "example.com"
    })
}
