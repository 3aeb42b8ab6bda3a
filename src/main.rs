use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paper_exchange::{
    EngineConfig, ExchangeSession, OrderRequest, OrderSide, PaperExchange, StdRandom,
};

const DEMO_SYMBOL: &str = "BTCUSD";
const DEMO_TICKS: u32 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_exchange=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting paper exchange");

    let config = EngineConfig::load()?;
    info!(
        "Configuration loaded: balance {}, commission {}, latency {}ms",
        config.initial_balance, config.commission_rate, config.latency_ms
    );
    let tick_interval = config.tick_interval();
    let live_ticking = config.live_ticking;

    let exchange = PaperExchange::new(config, Box::new(StdRandom::from_entropy()))?;
    let (handle, task) = ExchangeSession::spawn(exchange);

    let Some(quote) = handle.quote(DEMO_SYMBOL).await? else {
        anyhow::bail!("{} is not configured", DEMO_SYMBOL);
    };
    info!("{} bid {} / ask {}", quote.symbol, quote.bid, quote.ask);

    let order = handle
        .submit_order(
            OrderRequest::market(DEMO_SYMBOL, OrderSide::Buy, dec!(0.1)).with_strategy("demo"),
        )
        .await?;
    info!("Market order {} -> {:?}", order.id, order.status);

    // Resting bid half a percent under the market
    let limit_price = (quote.bid * dec!(0.995)).round_dp(2);
    match handle
        .submit_order(OrderRequest::limit(DEMO_SYMBOL, OrderSide::Buy, dec!(0.05), limit_price))
        .await
    {
        Ok(order) => info!("Limit order {} resting at {}", order.id, limit_price),
        Err(e) => warn!("Limit order not placed: {}", e),
    }

    for _ in 0..DEMO_TICKS {
        if live_ticking {
            tokio::time::sleep(tick_interval).await;
        } else {
            handle.tick().await?;
        }
    }
    // let any latency-delayed fills land
    tokio::time::sleep(Duration::from_millis(250)).await;

    let account = handle.account().await?;
    let positions = handle.positions().await?;
    let metrics = handle.metrics().await?;
    info!("Account: {}", serde_json::to_string_pretty(&account)?);
    info!("Positions: {}", serde_json::to_string_pretty(&positions)?);
    info!("Metrics: {}", serde_json::to_string_pretty(&metrics)?);

    let open_quantity: Decimal = positions.iter().map(|p| p.quantity).sum();
    info!(
        "Session done: {} open units, equity {}",
        open_quantity, account.equity
    );

    handle.shutdown().await?;
    task.await?;
    Ok(())
}
