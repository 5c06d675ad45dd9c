use crate::core::config::{BaseUrlKey, ExchangeConfig, Product};
use crate::core::errors::ExchangeError;
use crate::core::kernel::ReqwestRest;
use crate::exchanges::futures::build_rest;
use crate::exchanges::usdm::rest::UsdmRestClient;

/// Create a USDⓈ-M client from configuration
pub fn build_client(config: &ExchangeConfig) -> Result<UsdmRestClient<ReqwestRest>, ExchangeError> {
    let category = BaseUrlKey::new(Product::UsdM, config.network);
    let rest = build_rest(config, category)?;
    Ok(UsdmRestClient::new(rest, category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::RestClient;

    #[test]
    fn test_mainnet_client() {
        let config = ExchangeConfig::new("key".to_string(), "secret".to_string());
        let client = build_client(&config).unwrap();
        assert!(client.rest().has_credentials());
        assert_eq!(client.category().name(), "usdm");
        assert_eq!(client.rest().config().base_url, "https://fapi.binance.com");
        assert_eq!(client.rest().config().server_time_endpoint, "/fapi/v1/time");
    }

    #[test]
    fn test_testnet_client() {
        let client = build_client(&ExchangeConfig::read_only().testnet(true)).unwrap();
        assert!(!client.rest().has_credentials());
        assert_eq!(client.category().name(), "usdmtest");
        assert_eq!(
            client.rest().config().base_url,
            "https://testnet.binancefuture.com"
        );
    }

    #[test]
    fn test_explicit_base_url_wins() {
        let config = ExchangeConfig::read_only().base_url("http://127.0.0.1:9000".to_string());
        let client = build_client(&config).unwrap();
        assert_eq!(client.rest().config().base_url, "http://127.0.0.1:9000");
    }
}
