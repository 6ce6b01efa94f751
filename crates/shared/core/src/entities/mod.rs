mod aggregated;
mod decision;
mod order;
mod portfolio;
mod signal;
mod snapshot;

pub use aggregated::{AggregatedSignal, Degradation, SourceContribution, SourceStatus};
pub use decision::{Action, TradeDecision};
pub use order::{FillResult, OrderAck, OrderRequest};
pub use portfolio::{DailyPnL, PortfolioState, Position};
pub use signal::{Signal, SignalSource};
pub use snapshot::{MarketSnapshot, returns_volatility};
