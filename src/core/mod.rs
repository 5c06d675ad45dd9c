pub mod config;
pub mod errors;
pub mod kernel;
pub mod order_id;
pub mod types;
