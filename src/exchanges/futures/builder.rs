use crate::core::config::{BaseUrlKey, ExchangeConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{HmacSigner, ReqwestRest, RestClientBuilder, RestClientConfig};
use std::sync::Arc;
use std::time::Duration;

/// Build the request core for one API category
pub fn build_rest(config: &ExchangeConfig, category: BaseUrlKey) -> Result<ReqwestRest, ExchangeError> {
    let product = category.product;
    let rest_config = RestClientConfig::new(
        config.resolve_base_url(product),
        category.name().to_string(),
    )
    .with_timeout(Duration::from_secs(config.timeout_seconds))
    .with_recv_window(config.recv_window)
    .with_server_time_endpoint(product.server_time_endpoint())
    .with_time_sync_disabled(config.disable_time_sync)
    .with_time_sync_interval(Duration::from_secs(config.time_sync_interval_seconds));

    let mut rest_builder = RestClientBuilder::new(rest_config);

    // Add authentication if credentials are provided
    if config.has_credentials() {
        let signer = Arc::new(HmacSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
        ));
        rest_builder = rest_builder.with_signer(signer);
    }

    rest_builder.build()
}
