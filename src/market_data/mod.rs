use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::config::MarketConfig;
use crate::error::{EngineError, Result};
use crate::random::RandomSource;

const PRICE_DP: u32 = 8;
const VOLUME_STEP: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
}

struct Instrument {
    quote: Quote,
    history: VecDeque<Decimal>,
}

/// Synthetic per-symbol quote stream driven by a bounded random walk.
pub struct MarketDataFeed {
    spread_fraction: Decimal,
    drift: f64,
    volatility: f64,
    history_capacity: usize,
    instruments: HashMap<String, Instrument>,
    symbols: Vec<String>,
}

impl MarketDataFeed {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let mut feed = Self {
            spread_fraction: config.spread_fraction,
            drift: config.drift,
            volatility: config.volatility,
            history_capacity: config.history_capacity,
            instruments: HashMap::new(),
            symbols: Vec::new(),
        };
        for seed in &config.symbols {
            feed.add_symbol(&seed.symbol, seed.initial_price, seed.volume)?;
        }
        Ok(feed)
    }

    /// Registers a symbol, or re-seeds it if already tracked.
    pub fn add_symbol(
        &mut self,
        symbol: &str,
        initial_price: Decimal,
        volume: Decimal,
    ) -> Result<()> {
        check_price(symbol, initial_price)?;
        let quote = self.make_quote(symbol, initial_price, volume);
        let mut history = VecDeque::with_capacity(self.history_capacity.min(1024));
        history.push_back(initial_price);

        if self
            .instruments
            .insert(symbol.to_string(), Instrument { quote, history })
            .is_none()
        {
            self.symbols.push(symbol.to_string());
        }
        Ok(())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.instruments.get(symbol).map(|i| &i.quote)
    }

    pub fn quotes(&self) -> impl Iterator<Item = &Quote> {
        self.symbols
            .iter()
            .filter_map(|s| self.instruments.get(s).map(|i| &i.quote))
    }

    /// Oldest-first price history.
    pub fn price_history(&self, symbol: &str) -> Option<Vec<Decimal>> {
        self.instruments
            .get(symbol)
            .map(|i| i.history.iter().copied().collect())
    }

    /// Advances every tracked symbol by one random-walk step.
    pub fn tick(&mut self, rng: &mut dyn RandomSource) {
        for symbol in self.symbols.clone() {
            let Some(current) = self.instruments.get(&symbol).map(|i| i.quote.clone()) else {
                continue;
            };

            let step = self.drift + self.volatility * rng.next_signed();
            let factor = Decimal::from_f64(1.0 + step).unwrap_or(Decimal::ONE);
            let mut price = (current.price * factor).round_dp(PRICE_DP);
            if price <= Decimal::ZERO {
                price = current.price;
            }

            let volume_factor =
                Decimal::from_f64(1.0 + VOLUME_STEP * rng.next_signed()).unwrap_or(Decimal::ONE);
            let volume = (current.volume * volume_factor).round_dp(2);

            self.push_price(&symbol, price, volume);
        }
    }

    /// Applies an externally supplied last price (replay / backtest driving).
    pub fn update_price(&mut self, symbol: &str, price: Decimal) -> Result<&Quote> {
        let volume = self
            .instruments
            .get(symbol)
            .map(|i| i.quote.volume)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        check_price(symbol, price)?;
        self.push_price(symbol, price, volume);
        self.quote(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    fn push_price(&mut self, symbol: &str, price: Decimal, volume: Decimal) {
        let quote = self.make_quote(symbol, price, volume);
        let capacity = self.history_capacity;
        if let Some(instrument) = self.instruments.get_mut(symbol) {
            instrument.quote = quote;
            instrument.history.push_back(price);
            while instrument.history.len() > capacity {
                instrument.history.pop_front();
            }
        }
    }

    fn make_quote(&self, symbol: &str, price: Decimal, volume: Decimal) -> Quote {
        let half_spread = price * self.spread_fraction / Decimal::TWO;
        Quote {
            symbol: symbol.to_string(),
            price,
            bid: price - half_spread,
            ask: price + half_spread,
            volume,
            timestamp: Utc::now(),
        }
    }
}

fn check_price(symbol: &str, price: Decimal) -> Result<()> {
    // headroom for the spread and a walk step
    if price <= Decimal::ZERO || price.checked_mul(Decimal::TEN).is_none() {
        return Err(EngineError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        });
    }
    Ok(())
}
