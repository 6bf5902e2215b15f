//! The valuation engine: folds the transaction log and market prices into
//! per-symbol holdings, aggregate totals, spending cadence, entry points,
//! and the month-by-month historical valuation curve.
//!
//! This is a pure, single-pass computation; all inputs are materialized
//! before `calculate()` runs and one `Portfolio` is scoped to one run.

use crate::core::market::{PriceHistory, PriceSnapshot};
use crate::core::month::Month;
use crate::core::transaction::{TransactionLog, TxKind};
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::debug;

/// Conservative estimate of what a full liquidation would realize.
pub const CASH_OUT_FACTOR: f64 = 0.95;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("transaction log is empty")]
    EmptyLog,
    #[error("no price for {symbol} in period {period}")]
    MissingPrice { symbol: String, period: String },
}

/// A position in one symbol, derived from the full transaction replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub exchange: String,
    pub amount: f64,
    pub value: f64,
    pub spending: f64,
    pub spending_percent: f64,
    pub profit_net: f64,
    pub profit_percent: f64,
    pub current_price: f64,
    pub break_even_price: f64,
    /// Target prices at break-even times 1.25 through 2.50.
    pub price25: f64,
    pub price50: f64,
    pub price75: f64,
    pub price100: f64,
    pub price150: f64,
}

impl Holding {
    fn refresh_targets(&mut self) {
        self.price25 = self.break_even_price * 1.25;
        self.price50 = self.break_even_price * 1.50;
        self.price75 = self.break_even_price * 1.75;
        self.price100 = self.break_even_price * 2.00;
        self.price150 = self.break_even_price * 2.50;
    }
}

/// Holdings keyed by symbol, preserving first-seen order from the replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holdings {
    entries: Vec<Holding>,
}

impl Holdings {
    fn entry(&mut self, symbol: &str, exchange: &str) -> &mut Holding {
        if let Some(index) = self.entries.iter().position(|h| h.symbol == symbol) {
            return &mut self.entries[index];
        }
        self.entries.push(Holding {
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
            ..Holding::default()
        });
        self.entries.last_mut().unwrap()
    }

    pub fn get(&self, symbol: &str) -> Option<&Holding> {
        self.entries.iter().find(|h| h.symbol == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Holdings {
    type Item = &'a Holding;
    type IntoIter = std::slice::Iter<'a, Holding>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Aggregate metrics for the whole portfolio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub value: f64,
    pub spending: f64,
    pub profit_net: f64,
    pub profit_percent: f64,
    pub cash_out: f64,
    pub time_interval_days: i64,
    pub time_interval_months: f64,
    pub time_interval_years: f64,
    pub avg_day_roi: f64,
    pub avg_month_roi: f64,
    pub avg_year_roi: f64,
}

/// Chronological per-month series, labeled with short month codes.
pub type MonthSeries = Vec<(String, f64)>;

pub struct Portfolio<'a> {
    log: &'a TransactionLog,
    snapshot: &'a PriceSnapshot,
}

impl<'a> Portfolio<'a> {
    pub fn new(log: &'a TransactionLog, snapshot: &'a PriceSnapshot) -> Self {
        Portfolio { log, snapshot }
    }

    /// Replays the log against current prices and returns the surviving
    /// holdings plus aggregate totals. Elapsed-time metrics run up to
    /// today.
    pub fn calculate(&self) -> Result<(Holdings, Totals), PortfolioError> {
        self.calculate_at(Utc::now().date_naive())
    }

    /// Same as [`calculate`](Self::calculate) with an explicit "now" for
    /// the elapsed-time metrics.
    pub fn calculate_at(&self, as_of: NaiveDate) -> Result<(Holdings, Totals), PortfolioError> {
        let first_date = self.log.first_date().ok_or(PortfolioError::EmptyLog)?;

        let mut holdings = Holdings::default();
        let mut totals = Totals::default();

        // Replay in log order, not date order.
        for tx in self.log.iter() {
            let holding = holdings.entry(&tx.symbol, &tx.exchange);
            match tx.kind {
                TxKind::Buy => {
                    holding.amount += tx.quantity;
                    let cost = tx.net_cost();
                    holding.spending += cost;
                    totals.spending += cost;

                    let price = self.snapshot.price(&tx.symbol).ok_or_else(|| {
                        PortfolioError::MissingPrice {
                            symbol: tx.symbol.clone(),
                            period: "current".to_string(),
                        }
                    })?;
                    holding.current_price = price;
                    holding.value = holding.amount * price;
                    // amount > 0 here, a buy just landed
                    holding.break_even_price = holding.spending / holding.amount;
                    holding.profit_net = holding.value - holding.spending;
                    holding.profit_percent = if holding.spending != 0.0 {
                        holding.profit_net / holding.spending * 100.0
                    } else {
                        0.0
                    };
                    holding.refresh_targets();
                }
                TxKind::Sell => {
                    holding.amount -= tx.quantity;
                    holding.value = holding.amount * holding.current_price;
                    // The position's entire accumulated spending comes off
                    // the total, not a quantity-weighted share. Kept as-is
                    // from the sheet tracker this replaces; see DESIGN.md.
                    totals.spending -= holding.spending;
                }
                // Record-keeping kinds do not move the position.
                _ => {}
            }
        }

        // Closed positions are not holdings.
        holdings.entries.retain(|h| h.amount != 0.0);

        for holding in &mut holdings.entries {
            holding.spending_percent = if totals.spending != 0.0 {
                holding.spending / totals.spending * 100.0
            } else {
                0.0
            };
            totals.value += holding.value;
            debug!(
                "{}: amount {}, value {:.2}, spending {:.2}, profit {:.2}%",
                holding.symbol,
                holding.amount,
                holding.value,
                holding.spending,
                holding.profit_percent
            );
        }

        totals.profit_net = totals.value - totals.spending;
        totals.profit_percent = if totals.spending != 0.0 {
            totals.profit_net / totals.spending * 100.0
        } else {
            0.0
        };
        totals.cash_out = totals.value * CASH_OUT_FACTOR;

        let days = (as_of - first_date).num_days();
        totals.time_interval_days = days;
        totals.time_interval_months = days as f64 / 30.0;
        totals.time_interval_years = days as f64 / 365.0;
        if days > 0 {
            totals.avg_day_roi = totals.profit_percent / days as f64;
            totals.avg_month_roi = totals.avg_day_roi * 30.0;
            totals.avg_year_roi = totals.avg_day_roi * 365.0;
        }

        Ok((holdings, totals))
    }

    /// Buy-side net cost per calendar month, from the first to the last
    /// transaction month inclusive. Months without buys emit 0.
    pub fn spending_history(&self) -> Result<MonthSeries, PortfolioError> {
        let first = self.log.first_date().ok_or(PortfolioError::EmptyLog)?;
        let last = self.log.last_date().ok_or(PortfolioError::EmptyLog)?;

        let mut series = MonthSeries::new();
        for month in Month::from(first).until(Month::from(last)) {
            let spent: f64 = self
                .log
                .in_month(month)
                .filter(|t| t.kind == TxKind::Buy)
                .map(|t| t.net_cost())
                .sum();
            series.push((month.short_label(), spent));
        }
        Ok(series)
    }

    /// The month of each symbol's first buy, in order of those first buys.
    /// Symbols never bought do not appear.
    pub fn entry_points(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = Vec::new();
        for tx in self.log.sorted_by_date() {
            if tx.kind == TxKind::Buy && !entries.iter().any(|(s, _)| s == &tx.symbol) {
                entries.push((tx.symbol.clone(), tx.month().short_label()));
            }
        }
        entries
    }

    /// Cumulative valuation per month, replayed against historical prices.
    ///
    /// Both buys and sells add `quantity * price` to the accumulator; the
    /// sheet tracker this replaces never subtracted on sells and that
    /// behavior is kept deliberately (see DESIGN.md). Months without
    /// transactions carry the previous value forward.
    pub fn historical_valuation(
        &self,
        history: &PriceHistory,
    ) -> Result<MonthSeries, PortfolioError> {
        let first = self.log.first_date().ok_or(PortfolioError::EmptyLog)?;
        let last = self.log.last_date().ok_or(PortfolioError::EmptyLog)?;

        let mut series = MonthSeries::new();
        let mut valuation = 0.0;
        for month in Month::from(first).until(Month::from(last)) {
            let label = month.short_label();
            for tx in self.log.in_month(month) {
                match tx.kind {
                    TxKind::Buy | TxKind::Sell => {
                        let price = history.price_at(&tx.symbol, &label).ok_or_else(|| {
                            PortfolioError::MissingPrice {
                                symbol: tx.symbol.clone(),
                                period: label.clone(),
                            }
                        })?;
                        valuation += tx.quantity * price;
                    }
                    _ => {}
                }
            }
            series.push((label, valuation));
        }
        Ok(series)
    }
}
