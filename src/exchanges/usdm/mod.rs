pub mod builder; // configuration → concrete client
pub mod rest; // typed routes over RestClient
pub mod types; // algo, broker and USDⓈ-M-only shapes

pub use builder::build_client;
pub use rest::UsdmRestClient;
pub use types::*;
