pub mod core;
pub mod exchanges;

pub use core::config::{BaseUrlKey, ExchangeConfig, Network, Product};
pub use core::errors::ExchangeError;
pub use core::kernel::{ReqwestRest, RestClient};
pub use core::order_id::{generate_new_order_id, validate_order_id, OrderIdCheck};
pub use core::types::{Endpoint, Params, Security};
pub use exchanges::coinm::CoinmRestClient;
pub use exchanges::usdm::UsdmRestClient;
