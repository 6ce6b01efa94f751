//! Session configuration
//!
//! Loaded once from JSON at session start and validated before anything
//! runs. Every key is optional; missing keys take the defaults below.
//!
//! ```json
//! {
//!   "watchlist": ["AAPL", "MSFT", "BTC"],
//!   "cache_ttl_by_source": { "technical": 60, "sentiment": 3600, "order_flow": 300 },
//!   "source_weights": { "technical": 1.0, "sentiment": 0.5, "order_flow": 0.5 },
//!   "quorum": 2,
//!   "max_daily_loss": 500,
//!   "cycle_timeout_ms": 5000,
//!   "worker_pool_size": 4,
//!   "trading_hours": { "open": "13:30", "close": "20:00" }
//! }
//! ```

use chrono::{Duration, NaiveTime};
use quorum_core::{SignalSource, Symbol, Timestamp};
use quorum_gateway::{PaperExecutionConfig, RandomWalkConfig};
use quorum_order_manager::{AggregatorConfig, RetryPolicy};
use quorum_ports::{OrderFlowReading, SentimentReading};
use quorum_risk_manager::{ExitRules, RiskConfig, RiskLimits, SizingParameters};
use quorum_signals::TechnicalConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::ConfigError;

/// UTC window in which ticks start cycles
///
/// `open > close` wraps past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingHours {
    /// "HH:MM"
    pub open: String,
    /// "HH:MM"
    pub close: String,
}

impl TradingHours {
    fn parse(value: &str) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|e| ConfigError::Invalid(format!("trading hour {:?}: {}", value, e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let open = Self::parse(&self.open)?;
        let close = Self::parse(&self.close)?;
        if open == close {
            return Err(ConfigError::Invalid(
                "trading_hours.open and close must differ".into(),
            ));
        }
        Ok(())
    }

    /// Whether `at` falls inside the window (open inclusive, close exclusive)
    pub fn contains(&self, at: Timestamp) -> bool {
        let (Ok(open), Ok(close)) = (Self::parse(&self.open), Self::parse(&self.close)) else {
            return false;
        };
        let now = at.time();
        if open < close {
            open <= now && now < close
        } else {
            now >= open || now < close
        }
    }
}

/// Inputs for the paper adapters wired by the `quorum` binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub market: RandomWalkConfig,
    pub execution: PaperExecutionConfig,
    /// Sentiment served for every symbol without its own reading
    pub sentiment: Option<SentimentReading>,
    pub sentiment_by_symbol: BTreeMap<Symbol, SentimentReading>,
    /// Order flow served for every symbol without its own reading
    pub order_flow: Option<OrderFlowReading>,
    pub order_flow_by_symbol: BTreeMap<Symbol, OrderFlowReading>,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            market: RandomWalkConfig::default(),
            execution: PaperExecutionConfig::default(),
            sentiment: Some(SentimentReading {
                reading: dec!(0.5),
                risk_level: Default::default(),
            }),
            sentiment_by_symbol: BTreeMap::new(),
            order_flow: None,
            order_flow_by_symbol: BTreeMap::new(),
        }
    }
}

/// Everything a trading session is configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub watchlist: Vec<Symbol>,
    /// Seconds a provider's signal stays reusable
    pub cache_ttl_by_source: BTreeMap<SignalSource, u64>,
    pub source_weights: BTreeMap<SignalSource, Decimal>,
    pub quorum: usize,
    pub confidence_floor: Decimal,
    pub neutral_band: Decimal,

    pub max_position_fraction: Decimal,
    pub max_daily_loss: Decimal,
    pub max_open_positions: usize,
    pub max_daily_profit: Option<Decimal>,
    pub starting_capital: Decimal,
    pub volatility_penalty: Decimal,
    pub min_volatility_factor: Decimal,
    pub exit_rules: ExitRules,

    /// Budget for fetching plus analysis in one cycle
    pub cycle_timeout_ms: u64,
    pub worker_pool_size: usize,
    pub tick_interval_ms: u64,
    pub trading_hours: Option<TradingHours>,
    pub execution: RetryPolicy,

    pub technical: TechnicalConfig,
    pub paper: PaperConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let aggregator = AggregatorConfig::default();
        let limits = RiskLimits::default();
        let sizing = SizingParameters::default();
        let risk = RiskConfig::default();
        Self {
            watchlist: ["TSLA", "META", "MSTR", "MSFT", "GOOGL", "BTC", "ETH"]
                .into_iter()
                .map(Symbol::from)
                .collect(),
            cache_ttl_by_source: BTreeMap::from([
                (SignalSource::Technical, 60),
                (SignalSource::Sentiment, 3_600),
                (SignalSource::OrderFlow, 300),
            ]),
            source_weights: aggregator.source_weights,
            quorum: aggregator.quorum,
            confidence_floor: aggregator.confidence_floor,
            neutral_band: aggregator.neutral_band,
            max_position_fraction: limits.max_position_fraction,
            max_daily_loss: limits.max_daily_loss,
            max_open_positions: limits.max_open_positions,
            max_daily_profit: limits.max_daily_profit,
            starting_capital: risk.starting_capital,
            volatility_penalty: sizing.volatility_penalty,
            min_volatility_factor: sizing.min_volatility_factor,
            exit_rules: risk.exits,
            cycle_timeout_ms: 5_000,
            worker_pool_size: 4,
            tick_interval_ms: 5_000,
            trading_hours: None,
            execution: RetryPolicy::default(),
            technical: TechnicalConfig::default(),
            paper: PaperConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Read, parse and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON document
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watchlist.is_empty() {
            return Err(ConfigError::Invalid("watchlist is empty".into()));
        }
        let mut seen = BTreeSet::new();
        for symbol in &self.watchlist {
            if symbol.as_str().trim().is_empty() {
                return Err(ConfigError::Invalid("watchlist contains an empty symbol".into()));
            }
            if !seen.insert(symbol) {
                return Err(ConfigError::Invalid(format!("{} listed twice in watchlist", symbol)));
            }
        }

        for (source, ttl) in &self.cache_ttl_by_source {
            if *ttl == 0 {
                return Err(ConfigError::Invalid(format!("cache ttl for {} must be > 0", source)));
            }
            if seconds(*ttl).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "cache ttl for {} is out of range: {}s",
                    source, ttl
                )));
            }
        }
        if self.cycle_timeout_ms == 0 {
            return Err(ConfigError::Invalid("cycle_timeout_ms must be > 0".into()));
        }
        if millis(self.cycle_timeout_ms).is_none() {
            return Err(ConfigError::Invalid(format!(
                "cycle_timeout_ms is out of range: {}",
                self.cycle_timeout_ms
            )));
        }
        if self.worker_pool_size == 0 {
            return Err(ConfigError::Invalid("worker_pool_size must be >= 1".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0".into()));
        }
        if millis(self.tick_interval_ms).is_none() {
            return Err(ConfigError::Invalid(format!(
                "tick_interval_ms is out of range: {}",
                self.tick_interval_ms
            )));
        }
        if self.execution.max_attempts == 0 {
            return Err(ConfigError::Invalid("execution.max_attempts must be >= 1".into()));
        }
        if let Some(hours) = &self.trading_hours {
            hours.validate()?;
        }

        self.aggregator_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.risk_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            source_weights: self.source_weights.clone(),
            quorum: self.quorum,
            confidence_floor: self.confidence_floor,
            neutral_band: self.neutral_band,
        }
    }

    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            limits: RiskLimits {
                max_position_fraction: self.max_position_fraction,
                max_daily_loss: self.max_daily_loss,
                max_open_positions: self.max_open_positions,
                max_daily_profit: self.max_daily_profit,
            },
            sizing: SizingParameters {
                volatility_penalty: self.volatility_penalty,
                min_volatility_factor: self.min_volatility_factor,
            },
            exits: self.exit_rules.clone(),
            starting_capital: self.starting_capital,
            confidence_floor: self.confidence_floor,
            neutral_band: self.neutral_band,
        }
    }

    /// Cache ttl for a source; sources without an entry are never reused
    pub fn ttl_for(&self, source: SignalSource) -> Duration {
        self.cache_ttl_by_source
            .get(&source)
            .and_then(|secs| seconds(*secs))
            .unwrap_or_else(Duration::zero)
    }

    pub fn ttl_by_source(&self) -> BTreeMap<SignalSource, Duration> {
        SignalSource::ALL
            .into_iter()
            .map(|source| (source, self.ttl_for(source)))
            .collect()
    }

    pub fn cycle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.cycle_timeout_ms)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

/// `secs` as a chrono duration, if it fits
fn seconds(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}

fn millis(ms: u64) -> Option<Duration> {
    i64::try_from(ms).ok().and_then(Duration::try_milliseconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.watchlist.len(), 7);
        assert_eq!(config.ttl_for(SignalSource::Technical), Duration::seconds(60));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SessionConfig::from_json(
            r#"{
                "watchlist": ["AAPL", "MSFT"],
                "source_weights": {"technical": 1.0, "sentiment": 0.5, "orderflow": 0.5},
                "max_daily_loss": 250,
                "exit_rules": {"stop_loss_pct": 0.03}
            }"#,
        )
        .unwrap();

        assert_eq!(config.watchlist, vec![Symbol::from("AAPL"), Symbol::from("MSFT")]);
        assert_eq!(config.source_weights[&SignalSource::OrderFlow], dec!(0.5));
        assert_eq!(config.risk_config().limits.max_daily_loss, dec!(250));
        assert_eq!(config.exit_rules.stop_loss_pct, dec!(0.03));
        assert_eq!(config.exit_rules.take_profit_pct, dec!(0.05));
        assert_eq!(config.quorum, 2);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let cases = [
            r#"{"watchlist": []}"#,
            r#"{"watchlist": ["AAPL", "AAPL"]}"#,
            r#"{"quorum": 4}"#,
            r#"{"quorum": 0}"#,
            r#"{"max_daily_loss": 0}"#,
            r#"{"max_open_positions": 0}"#,
            r#"{"worker_pool_size": 0}"#,
            r#"{"cycle_timeout_ms": 0}"#,
            r#"{"cycle_timeout_ms": 18446744073709551615}"#,
            r#"{"tick_interval_ms": 18446744073709551615}"#,
            r#"{"cache_ttl_by_source": {"technical": 18446744073709551615}}"#,
            r#"{"cache_ttl_by_source": {"order_flow": 100000000000000000}}"#,
            r#"{"source_weights": {"technical": -1}}"#,
            r#"{"trading_hours": {"open": "09:30", "close": "09:30"}}"#,
            r#"{"trading_hours": {"open": "9h", "close": "16:00"}}"#,
        ];
        for raw in cases {
            let err = SessionConfig::from_json(raw).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{} -> {:?}", raw, err);
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = SessionConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = SessionConfig::from_json(r#"{"quorum": "two"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SessionConfig::from_file("/nonexistent/quorum.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_trading_hours_window() {
        let day = TradingHours {
            open: "13:30".into(),
            close: "20:00".into(),
        };
        let at = |h, m| Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap();
        assert!(day.contains(at(13, 30)));
        assert!(day.contains(at(19, 59)));
        assert!(!day.contains(at(20, 0)));
        assert!(!day.contains(at(8, 0)));

        let overnight = TradingHours {
            open: "22:00".into(),
            close: "04:00".into(),
        };
        assert!(overnight.contains(at(23, 0)));
        assert!(overnight.contains(at(3, 59)));
        assert!(!overnight.contains(at(12, 0)));
    }
}
