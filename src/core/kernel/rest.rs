use crate::core::errors::ExchangeError;
use crate::core::kernel::rate_limit::{RateLimitBucket, RateLimitRule, RateLimitTracker, RateLimitUsage};
use crate::core::kernel::signer::Signer;
use crate::core::kernel::time_sync::{local_time_ms, ServerTime, TimeSync};
use crate::core::types::{Endpoint, Params, Security};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace, warn};

/// Request core shared by every product façade
///
/// Implementations sign private routes, stamp them with the corrected
/// timestamp, dispatch, record rate-limit usage and normalise errors.
/// The typed verb helpers are provided on top of [`RestClient::request`].
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Dispatch a request to `endpoint` with `params`
    ///
    /// # Returns
    /// The parsed response body; an empty body is returned as `{}`
    async fn request(&self, endpoint: Endpoint<'_>, params: Params) -> Result<Value, ExchangeError>;

    /// Force a clock sync against the exchange and return the new offset
    async fn sync_time(&self) -> Result<i64, ExchangeError>;

    /// Current local-to-server clock offset in milliseconds
    fn time_offset(&self) -> i64;

    /// Snapshot of exchange-reported quota usage
    fn rate_limit_states(&self) -> HashMap<RateLimitBucket, RateLimitUsage>;

    /// Record published quota limits
    fn apply_rate_limit_rules(&self, rules: &[RateLimitRule]);

    /// Whether private routes can be called
    fn has_credentials(&self) -> bool;

    /// Unauthenticated GET
    async fn get<T: DeserializeOwned>(&self, path: &str, params: Params) -> Result<T, ExchangeError> {
        let value = self.request(Endpoint::public(Method::GET, path), params).await?;
        decode(value)
    }

    /// Signed GET
    async fn get_private<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> Result<T, ExchangeError> {
        let value = self.request(Endpoint::signed(Method::GET, path), params).await?;
        decode(value)
    }

    /// Signed POST
    async fn post_private<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> Result<T, ExchangeError> {
        let value = self.request(Endpoint::signed(Method::POST, path), params).await?;
        decode(value)
    }

    /// Signed PUT
    async fn put_private<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> Result<T, ExchangeError> {
        let value = self.request(Endpoint::signed(Method::PUT, path), params).await?;
        decode(value)
    }

    /// Signed DELETE
    async fn delete_private<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> Result<T, ExchangeError> {
        let value = self
            .request(Endpoint::signed(Method::DELETE, path), params)
            .await?;
        decode(value)
    }

    /// API-key-only request with any verb
    async fn keyed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<T, ExchangeError> {
        let value = self.request(Endpoint::keyed(method, path), params).await?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ExchangeError> {
    serde_json::from_value(value).map_err(ExchangeError::JsonError)
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Staleness tolerance sent with signed requests
    pub recv_window: Option<u64>,
    /// Unauthenticated route returning `{"serverTime": ..}`
    pub server_time_endpoint: String,
    /// Keep the clock offset at zero
    pub disable_time_sync: bool,
    /// How long a clock sync stays fresh
    pub time_sync_interval: Duration,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `exchange_name` - Name used in logs
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout: Duration::from_secs(30),
            user_agent: concat!("futures-connector/", env!("CARGO_PKG_VERSION")).to_string(),
            recv_window: None,
            server_time_endpoint: String::new(),
            disable_time_sync: false,
            time_sync_interval: Duration::from_secs(3600),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_recv_window(mut self, recv_window: Option<u64>) -> Self {
        self.recv_window = recv_window;
        self
    }

    pub fn with_server_time_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.server_time_endpoint = endpoint.into();
        self
    }

    pub fn with_time_sync_disabled(mut self, disabled: bool) -> Self {
        self.disable_time_sync = disabled;
        self
    }

    pub fn with_time_sync_interval(mut self, interval: Duration) -> Self {
        self.time_sync_interval = interval;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the REST client
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                crate::core::config::ConfigError::InvalidConfiguration(format!(
                    "Failed to build HTTP client: {}",
                    e
                ))
            })?;

        // Without a server-time route there is nothing to sync against
        let time_sync = if self.config.disable_time_sync || self.config.server_time_endpoint.is_empty() {
            TimeSync::disabled()
        } else {
            TimeSync::new(false, self.config.time_sync_interval)
        };

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            time_sync: Arc::new(time_sync),
            rate_limits: Arc::new(RateLimitTracker::new()),
        })
    }
}

/// Implementation of `RestClient` using reqwest
///
/// Clones share the clock offset and rate-limit state.
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    time_sync: Arc<TimeSync>,
    rate_limits: Arc<RateLimitTracker>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .field("time_offset", &self.time_sync.offset())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn time_sync(&self) -> &TimeSync {
        &self.time_sync
    }

    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, query)
        }
    }

    /// Sync the clock when it was never synced or has gone stale.
    ///
    /// A failed sync is not fatal: the offset falls back to zero.
    async fn ensure_time_synced(&self) {
        if !self.time_sync.needs_sync(local_time_ms()) {
            return;
        }

        let _guard = self.time_sync.lock().await;
        if !self.time_sync.needs_sync(local_time_ms()) {
            return;
        }

        if let Err(e) = self.sync_clock().await {
            warn!(
                exchange = %self.config.exchange_name,
                error = %e,
                "clock sync failed, signing with local time"
            );
        }
    }

    async fn sync_clock(&self) -> Result<i64, ExchangeError> {
        match self.fetch_server_time().await {
            Ok(server_time) => Ok(self.time_sync.apply(server_time, local_time_ms())),
            Err(e) => {
                self.time_sync.reset(local_time_ms());
                Err(e)
            }
        }
    }

    async fn fetch_server_time(&self) -> Result<i64, ExchangeError> {
        let value = self
            .dispatch(
                Method::GET,
                &self.config.server_time_endpoint,
                String::new(),
                HashMap::new(),
            )
            .await?;
        let ServerTime { server_time } = decode(value)?;
        Ok(server_time)
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let response_text = response.text().await?;

        trace!("Response body: {}", response_text);

        if !status.is_success() {
            return Err(ExchangeError::from_response(status.as_u16(), &response_text));
        }

        if response_text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        Ok(serde_json::from_str(&response_text)?)
    }

    /// Send a prepared request and record its rate-limit headers
    #[instrument(skip(self, query, headers), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        query: String,
        headers: HashMap<String, String>,
    ) -> Result<Value, ExchangeError> {
        let url = self.build_url(endpoint, &query);
        let mut request = self
            .client
            .request(method, url)
            .timeout(self.config.timeout);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        self.rate_limits.record_response(response.headers());

        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, param_count = params.len()))]
    async fn request(&self, endpoint: Endpoint<'_>, params: Params) -> Result<Value, ExchangeError> {
        let signer = if endpoint.security.requires_credentials() {
            Some(
                self.signer
                    .as_ref()
                    .ok_or(ExchangeError::AuthenticationRequired)?,
            )
        } else {
            None
        };

        let mut params = params;
        if endpoint.security == Security::Signed {
            self.ensure_time_synced().await;
            params.insert("timestamp", self.time_sync.timestamp_at(local_time_ms()));
            params.insert_opt("recvWindow", self.config.recv_window);
        }

        let mut query = params.to_query_string();
        let mut headers = HashMap::new();

        if let Some(signer) = signer {
            let (signed_headers, signed_params) = signer.sign_request(endpoint.security, &query)?;
            headers.extend(signed_headers);
            if !signed_params.is_empty() {
                let suffix = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(signed_params.iter())
                    .finish();
                if !query.is_empty() {
                    query.push('&');
                }
                query.push_str(&suffix);
            }
        }

        self.dispatch(endpoint.method, endpoint.path, query, headers)
            .await
    }

    async fn sync_time(&self) -> Result<i64, ExchangeError> {
        if self.time_sync.is_disabled() {
            return Ok(0);
        }
        let _guard = self.time_sync.lock().await;
        self.sync_clock().await
    }

    fn time_offset(&self) -> i64 {
        self.time_sync.offset()
    }

    fn rate_limit_states(&self) -> HashMap<RateLimitBucket, RateLimitUsage> {
        self.rate_limits.snapshot()
    }

    fn apply_rate_limit_rules(&self, rules: &[RateLimitRule]) {
        self.rate_limits.apply_rules(rules);
    }

    fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }
}
