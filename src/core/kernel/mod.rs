//! Transport kernel shared by every product façade
//!
//! - `RestClient`: capability trait the façades are generic over
//! - `ReqwestRest`: reqwest-backed implementation that signs, stamps,
//!   dispatches and records rate-limit usage
//! - `Signer` / `HmacSigner`: request authentication
//! - `TimeSync`: local-to-server clock offset
//! - `RateLimitTracker`: observed quota usage
//!
//! # Example
//! ```rust,no_run
//! use futures_connector::core::kernel::*;
//! use futures_connector::core::types::Params;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let rest_config = RestClientConfig::new(
//!     "https://dapi.binance.com".to_string(),
//!     "coinm".to_string(),
//! )
//! .with_server_time_endpoint("/dapi/v1/time");
//! let signer = Arc::new(HmacSigner::new("api_key".to_string(), "secret_key".to_string()));
//! let rest = RestClientBuilder::new(rest_config).with_signer(signer).build()?;
//!
//! let time: ServerTime = rest.get("/dapi/v1/time", Params::new()).await?;
//! println!("offset after sync: {}", rest.sync_time().await?);
//! # let _ = time;
//! # Ok(())
//! # }
//! ```
pub mod rate_limit;
pub mod rest;
pub mod signer;
pub mod time_sync;

// Re-export key types for convenience
pub use rate_limit::{
    RateLimitBucket, RateLimitInterval, RateLimitRule, RateLimitTracker, RateLimitType,
    RateLimitUsage,
};
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{HmacSigner, SignatureResult, Signer, API_KEY_HEADER};
pub use time_sync::{ServerTime, TimeSync, FAILED_SYNC_RETRY};
