use crate::core::config::{BaseUrlKey, ExchangeConfig, Product};
use crate::core::errors::ExchangeError;
use crate::core::kernel::ReqwestRest;
use crate::exchanges::coinm::rest::CoinmRestClient;
use crate::exchanges::futures::build_rest;

/// Create a COIN-M client from configuration
///
/// Without credentials only public routes are usable; private ones fail
/// with `AuthenticationRequired` before anything is sent.
pub fn build_client(config: &ExchangeConfig) -> Result<CoinmRestClient<ReqwestRest>, ExchangeError> {
    let category = BaseUrlKey::new(Product::CoinM, config.network);
    let rest = build_rest(config, category)?;
    Ok(CoinmRestClient::new(rest, category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::RestClient;

    #[test]
    fn test_read_only_client_has_no_credentials() {
        let client = build_client(&ExchangeConfig::read_only()).unwrap();
        assert!(!client.rest().has_credentials());
        assert_eq!(client.category().name(), "coinm");
        assert_eq!(client.rest().config().base_url, "https://dapi.binance.com");
    }

    #[test]
    fn test_testnet_selects_testnet_category() {
        let config = ExchangeConfig::new("key".to_string(), "secret".to_string()).testnet(true);
        let client = build_client(&config).unwrap();
        assert!(client.rest().has_credentials());
        assert_eq!(client.category().name(), "coinmtest");
        assert_eq!(
            client.rest().config().base_url,
            "https://testnet.binancefuture.com"
        );
        assert_eq!(client.rest().config().server_time_endpoint, "/dapi/v1/time");
    }

    #[test]
    fn test_config_flows_into_core() {
        let config = ExchangeConfig::read_only()
            .recv_window(7000)
            .disable_time_sync(true)
            .timeout(5);
        let client = build_client(&config).unwrap();
        let core = client.rest().config();
        assert_eq!(core.recv_window, Some(7000));
        assert!(core.disable_time_sync);
        assert_eq!(core.timeout, std::time::Duration::from_secs(5));
        assert!(client.rest().time_sync().is_disabled());
    }
}
