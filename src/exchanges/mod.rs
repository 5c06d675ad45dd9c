pub mod coinm;
pub mod futures;
pub mod usdm;
