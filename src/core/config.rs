use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fmt;

/// Futures product family served by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    /// Coin-margined futures (`/dapi`)
    CoinM,
    /// USDT-margined futures (`/fapi`)
    UsdM,
}

impl Product {
    /// Route prefix shared by every endpoint of the product
    pub const fn api_prefix(self) -> &'static str {
        match self {
            Self::CoinM => "/dapi",
            Self::UsdM => "/fapi",
        }
    }

    /// Unauthenticated route returning the exchange clock
    pub const fn server_time_endpoint(self) -> &'static str {
        match self {
            Self::CoinM => "/dapi/v1/time",
            Self::UsdM => "/fapi/v1/time",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

/// Selects the base URL and API category of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseUrlKey {
    pub product: Product,
    pub network: Network,
}

impl BaseUrlKey {
    pub const fn new(product: Product, network: Network) -> Self {
        Self { product, network }
    }

    pub const fn base_url(self) -> &'static str {
        match (self.product, self.network) {
            (Product::CoinM, Network::Mainnet) => "https://dapi.binance.com",
            (Product::UsdM, Network::Mainnet) => "https://fapi.binance.com",
            (_, Network::Testnet) => "https://testnet.binancefuture.com",
        }
    }

    /// API category name, used for logging and order-id attribution
    pub const fn name(self) -> &'static str {
        match (self.product, self.network) {
            (Product::CoinM, Network::Mainnet) => "coinm",
            (Product::CoinM, Network::Testnet) => "coinmtest",
            (Product::UsdM, Network::Mainnet) => "usdm",
            (Product::UsdM, Network::Testnet) => "usdmtest",
        }
    }

    /// Broker prefix embedded in client order ids issued for this category
    pub const fn order_id_prefix(self) -> &'static str {
        match self.product {
            Product::CoinM | Product::UsdM => "15PC4ZJy",
        }
    }
}

impl fmt::Display for BaseUrlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub network: Network,
    pub base_url: Option<String>,
    pub disable_time_sync: bool,
    pub recv_window: Option<u64>,
    pub timeout_seconds: u64,
    pub time_sync_interval_seconds: u64,
}

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_TIME_SYNC_INTERVAL_SECONDS: u64 = 3600;

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 8)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("network", &self.network)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("disable_time_sync", &self.disable_time_sync)?;
        state.serialize_field("recv_window", &self.recv_window)?;
        state.serialize_field("timeout_seconds", &self.timeout_seconds)?;
        state.serialize_field(
            "time_sync_interval_seconds",
            &self.time_sync_interval_seconds,
        )?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            network: Network,
            base_url: Option<String>,
            #[serde(default)]
            disable_time_sync: bool,
            recv_window: Option<u64>,
            timeout_seconds: Option<u64>,
            time_sync_interval_seconds: Option<u64>,
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret_key: Secret::new(helper.secret_key),
            network: helper.network,
            base_url: helper.base_url,
            disable_time_sync: helper.disable_time_sync,
            recv_window: helper.recv_window,
            timeout_seconds: helper.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            time_sync_interval_seconds: helper
                .time_sync_interval_seconds
                .unwrap_or(DEFAULT_TIME_SYNC_INTERVAL_SECONDS),
        })
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            network: Network::Mainnet,
            base_url: None,
            disable_time_sync: false,
            recv_window: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            time_sync_interval_seconds: DEFAULT_TIME_SYNC_INTERVAL_SECONDS,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY` (e.g., `COINM_API_KEY`)
    /// - `{PREFIX}_SECRET_KEY`
    /// - `{PREFIX}_TESTNET` (optional, defaults to false)
    /// - `{PREFIX}_BASE_URL` (optional)
    /// - `{PREFIX}_RECV_WINDOW` (optional, milliseconds)
    /// - `{PREFIX}_DISABLE_TIME_SYNC` (optional, defaults to false)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;
        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let mut config = Self::new(api_key, secret_key)
            .testnet(env_flag(&format!("{}_TESTNET", prefix)))
            .disable_time_sync(env_flag(&format!("{}_DISABLE_TIME_SYNC", prefix)));

        if let Ok(base_url) = env::var(format!("{}_BASE_URL", prefix)) {
            config = config.base_url(base_url);
        }

        let recv_window_var = format!("{}_RECV_WINDOW", prefix);
        if let Ok(raw) = env::var(&recv_window_var) {
            let recv_window = raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!("{}: {}", recv_window_var, e))
            })?;
            config = config.recv_window(recv_window);
        }

        Ok(config)
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    ///
    /// A missing file is fine; system environment variables are used instead.
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Configuration for public endpoints only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.network = if testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        };
        self
    }

    /// Override the base URL selected from the network
    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Disable clock-drift correction; the offset stays at zero
    #[must_use]
    pub const fn disable_time_sync(mut self, disable: bool) -> Self {
        self.disable_time_sync = disable;
        self
    }

    #[must_use]
    pub const fn recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window = Some(recv_window_ms);
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    #[must_use]
    pub const fn time_sync_interval(mut self, interval_seconds: u64) -> Self {
        self.time_sync_interval_seconds = interval_seconds;
        self
    }

    pub const fn is_testnet(&self) -> bool {
        matches!(self.network, Network::Testnet)
    }

    /// Base URL for `product`, honouring an explicit override
    pub fn resolve_base_url(&self, product: Product) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            BaseUrlKey::new(product, self.network)
                .base_url()
                .to_string()
        })
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|value| value.parse::<bool>().unwrap_or(false))
        .unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
