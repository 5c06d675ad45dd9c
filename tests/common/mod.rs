#![allow(dead_code)]

use futures_connector::core::kernel::HmacSigner;
use futures_connector::ExchangeConfig;
use std::env;
use wiremock::{Match, Request};

pub const TEST_API_KEY: &str = "test_api_key";
pub const TEST_SECRET_KEY: &str = "test_secret_key";

/// Test configuration utilities
pub struct TestConfig;

impl TestConfig {
    /// Check if live API tests should run (requires network access)
    pub fn should_run_live_tests() -> bool {
        env::var("RUN_LIVE_TESTS").unwrap_or_default() == "true"
    }

    /// Credentialed config pointed at a mock server
    pub fn mock_config(base_url: &str) -> ExchangeConfig {
        ExchangeConfig::new(TEST_API_KEY.to_string(), TEST_SECRET_KEY.to_string())
            .base_url(base_url.to_string())
    }

    /// Same as `mock_config` but never touches the time route
    pub fn mock_config_without_sync(base_url: &str) -> ExchangeConfig {
        Self::mock_config(base_url).disable_time_sync(true)
    }

    pub fn mock_read_only_config(base_url: &str) -> ExchangeConfig {
        ExchangeConfig::read_only()
            .base_url(base_url.to_string())
            .disable_time_sync(true)
    }
}

/// Accepts a request only when its trailing `signature` is the HMAC of the
/// rest of the query string under the test secret.
pub struct ValidSignature;

impl Match for ValidSignature {
    fn matches(&self, request: &Request) -> bool {
        let Some(query) = request.url.query() else {
            return false;
        };
        let Some((payload, signature)) = query.rsplit_once("&signature=") else {
            return false;
        };
        let signer = HmacSigner::new(TEST_API_KEY.to_string(), TEST_SECRET_KEY.to_string());
        signer
            .signature(payload)
            .map(|expected| expected == signature)
            .unwrap_or(false)
    }
}

/// Query parameter value from a captured request
pub fn query_value(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
