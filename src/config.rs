use config::{Config as ConfigBuilder, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{EngineError, Result};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_balance: Decimal,
    /// Charged on every fill as a fraction of notional.
    pub commission_rate: Decimal,
    /// Maximum slippage either side of the quoted price, as a fraction.
    pub slippage: Decimal,
    pub latency_ms: u64,
    /// Fraction of notional reserved as margin (0.1 = 10x leverage).
    pub margin_multiplier: Decimal,
    pub min_quantity: Decimal,
    pub live_ticking: bool,
    pub tick_interval_ms: u64,
    pub market: MarketConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MarketConfig {
    pub spread_fraction: Decimal,
    pub drift: f64,
    pub volatility: f64,
    pub history_capacity: usize,
    pub symbols: Vec<SymbolConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SymbolConfig {
    pub symbol: String,
    pub initial_price: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            commission_rate: dec!(0.001),
            slippage: dec!(0.0005),
            latency_ms: 50,
            margin_multiplier: dec!(0.1),
            min_quantity: dec!(0.001),
            live_ticking: true,
            tick_interval_ms: 1000,
            market: MarketConfig::default(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            spread_fraction: dec!(0.0002),
            drift: 0.0,
            volatility: 0.001,
            history_capacity: 1000,
            symbols: vec![
                SymbolConfig {
                    symbol: "BTCUSD".to_string(),
                    initial_price: dec!(43200),
                    volume: dec!(25000),
                },
                SymbolConfig {
                    symbol: "ETHUSD".to_string(),
                    initial_price: dec!(2500),
                    volume: dec!(180000),
                },
                SymbolConfig {
                    symbol: "EURUSD".to_string(),
                    initial_price: dec!(1.085),
                    volume: dec!(95000000),
                },
            ],
        }
    }
}

impl EngineConfig {
    /// Layered load: `config/default`, then `config/{RUN_ENV}`, then
    /// `PAPER__*` environment variables.
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false));

        if let Ok(run_env) = env::var("RUN_ENV") {
            builder =
                builder.add_source(File::with_name(&format!("config/{}", run_env)).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("PAPER")
                .prefix_separator("__")
                .separator("__"),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_balance <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(
                "initial_balance must be positive".to_string(),
            ));
        }
        if self.commission_rate < Decimal::ZERO || self.slippage < Decimal::ZERO {
            return Err(EngineError::InvalidConfig(
                "commission_rate and slippage cannot be negative".to_string(),
            ));
        }
        if self.margin_multiplier <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(
                "margin_multiplier must be positive".to_string(),
            ));
        }
        if self.min_quantity <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(
                "min_quantity must be positive".to_string(),
            ));
        }
        if self.live_ticking && self.tick_interval_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "tick_interval_ms must be positive when live ticking".to_string(),
            ));
        }
        self.market.validate()
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl MarketConfig {
    pub fn validate(&self) -> Result<()> {
        if self.spread_fraction <= Decimal::ZERO || self.spread_fraction >= Decimal::ONE {
            return Err(EngineError::InvalidConfig(
                "spread_fraction must be in (0, 1)".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.volatility) || self.drift.abs() >= 1.0 {
            return Err(EngineError::InvalidConfig(
                "volatility must be in [0, 1) and |drift| below 1".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "history_capacity must be positive".to_string(),
            ));
        }
        if let Some(bad) = self
            .symbols
            .iter()
            .find(|s| s.initial_price <= Decimal::ZERO)
        {
            return Err(EngineError::InvalidConfig(format!(
                "initial price for {} must be positive",
                bad.symbol
            )));
        }
        Ok(())
    }
}
