//! Pieces shared by the COIN-M and USDⓈ-M façades
pub mod batch; // batchOrders / id-list encoding
pub mod builder; // configuration → request core
pub mod types; // serde structs ← raw JSON

pub use batch::{batch_orders_params, cancel_multiple_params, MAX_BATCH_ORDERS};
pub use builder::build_rest;
pub use types::*;
