pub mod builder; // configuration → concrete client
pub mod rest; // typed routes over RestClient
pub mod types; // COIN-M-only response shapes

pub use builder::build_client;
pub use rest::CoinmRestClient;
pub use types::*;
