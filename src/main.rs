use futures_connector::exchanges::{coinm, usdm};
use futures_connector::ExchangeConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Falls back to public routes only when COINM_API_KEY / COINM_SECRET_KEY are unset
    let config = ExchangeConfig::from_env("COINM").unwrap_or_else(|_| ExchangeConfig::read_only());

    let coinm = coinm::build_client(&config)?;
    coinm.test_connectivity().await?;
    println!("COIN-M server time: {}", coinm.get_server_time().await?);
    println!("COIN-M clock offset: {} ms", coinm.sync_time().await?);

    let info = coinm.get_exchange_info().await?;
    println!("COIN-M symbols: {}", info.symbols.len());
    for (bucket, usage) in coinm.get_rate_limit_states() {
        println!("  {bucket}: {usage:?}");
    }

    if config.has_credentials() {
        let balances = coinm.get_balance().await?;
        println!("COIN-M balances: {}", balances.len());
    }

    let usdm = usdm::build_client(&config)?;
    let marks = usdm.get_mark_price(Some("BTCUSDT")).await?;
    for mark in marks {
        println!("{} mark price {}", mark.symbol, mark.mark_price);
    }

    Ok(())
}
