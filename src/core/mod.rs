//! Core domain: configuration, the transaction ledger, market data, and
//! the valuation engine.

pub mod chart;
pub mod config;
pub mod log;
pub mod market;
pub mod month;
pub mod portfolio;
pub mod transaction;

// Re-export main types for cleaner imports
pub use market::{HistoryVariant, PriceHistory, PriceSnapshot};
pub use month::Month;
pub use portfolio::{Holding, Holdings, Portfolio, Totals};
pub use transaction::{Transaction, TransactionLog, TxKind};
