//! Market data: the current-price snapshot and per-symbol price history.
//!
//! Both are read from CSV sheet exports and normalized into the run's
//! default currency before the valuation engine sees them. Conversion goes
//! through the pivot symbol row (`USD`), which the live-market sheet must
//! always carry.

use crate::core::month::Month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Symbol whose snapshot price is the EUR/USD conversion rate.
pub const PIVOT_SYMBOL: &str = "USD";

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("market data is missing symbols: {}", .0.join(", "))]
    MissingSymbols(Vec<String>),
    #[error("live market data has no {PIVOT_SYMBOL} pivot row")]
    MissingPivot,
    #[error("invalid date for {symbol}: {value}")]
    InvalidDate { symbol: String, value: String },
    #[error("failed to read market rows")]
    Csv(#[from] csv::Error),
}

/// Granularity of the historical price sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryVariant {
    /// One close per month, keyed by short month label (`jan24`).
    #[default]
    Lite,
    /// One close per day, keyed by `YYYY-MM-DD`.
    Full,
}

impl FromStr for HistoryVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lite" => Ok(HistoryVariant::Lite),
            "full" => Ok(HistoryVariant::Full),
            _ => Err(anyhow::anyhow!("Invalid history variant: {}", s)),
        }
    }
}

impl Display for HistoryVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryVariant::Lite => write!(f, "lite"),
            HistoryVariant::Full => write!(f, "full"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    symbol: String,
    price: f64,
    currency: String,
}

/// Current price per symbol, aligned to the default currency.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    prices: HashMap<String, f64>,
    usd_rate: f64,
}

impl PriceSnapshot {
    /// Parses the live-market sheet (`symbol,price,currency`) and converts
    /// every price into `default_currency` using the pivot row.
    pub fn from_csv_str(data: &str, default_currency: &str) -> Result<Self, MarketError> {
        let default_currency = default_currency.to_uppercase();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        let mut rows: Vec<SnapshotRow> = Vec::new();
        for row in reader.deserialize::<SnapshotRow>() {
            let mut row = row?;
            row.symbol = row.symbol.to_uppercase();
            row.currency = row.currency.to_uppercase();
            rows.push(row);
        }

        let usd_rate = rows
            .iter()
            .find(|r| r.symbol == PIVOT_SYMBOL)
            .map(|r| r.price)
            .ok_or(MarketError::MissingPivot)?;

        let mut prices = HashMap::new();
        for row in rows {
            let price = align_price(row.price, &row.currency, &default_currency, usd_rate);
            debug!("{}: {} {}", row.symbol, price, default_currency);
            prices.insert(row.symbol, price);
        }
        Ok(PriceSnapshot { prices, usd_rate })
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    /// The raw pivot rate from the sheet (price of 1 USD in EUR).
    pub fn usd_rate(&self) -> f64 {
        self.usd_rate
    }

    /// Fails with the full list of symbols the sheet does not cover.
    pub fn verify(&self, symbols: &[String]) -> Result<(), MarketError> {
        let missing: Vec<String> = symbols
            .iter()
            .filter(|s| !self.prices.contains_key(*s))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MarketError::MissingSymbols(missing))
        }
    }
}

fn align_price(price: f64, currency: &str, default_currency: &str, usd_rate: f64) -> f64 {
    if default_currency == "EUR" && currency == "USD" {
        price * usd_rate
    } else if default_currency == "USD" && currency == "EUR" {
        price / usd_rate
    } else {
        price
    }
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Date", alias = "date")]
    date: String,
    #[serde(rename = "Close", alias = "close")]
    close: f64,
    #[serde(rename = "Currency", alias = "currency")]
    currency: String,
}

/// Historical prices per symbol, keyed by period label.
///
/// Labels are short month codes for the lite variant and `YYYY-MM-DD` for
/// the full variant. Full series additionally carry a derived month label
/// (last close of each month) so monthly bucketing resolves for either
/// variant.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    series: HashMap<String, BTreeMap<String, f64>>,
}

impl PriceHistory {
    /// Builds the aligned history from `(symbol, csv)` sheet exports.
    ///
    /// Currency alignment is per label against the pivot symbol's series;
    /// `fallback_usd_rate` (the snapshot pivot rate) covers labels the
    /// pivot series lacks.
    pub fn from_sources(
        sources: &[(String, String)],
        variant: HistoryVariant,
        default_currency: &str,
        fallback_usd_rate: f64,
    ) -> Result<Self, MarketError> {
        let default_currency = default_currency.to_uppercase();

        // label -> (price, currency), chronological per symbol
        let mut raw: HashMap<String, BTreeMap<String, (f64, String)>> = HashMap::new();
        for (symbol, data) in sources {
            let symbol = symbol.to_uppercase();
            let mut labels: BTreeMap<String, (f64, String)> = BTreeMap::new();
            for (date, close, currency) in parse_history_rows(&symbol, data)? {
                match variant {
                    HistoryVariant::Lite => {
                        labels.insert(Month::from(date).short_label(), (close, currency));
                    }
                    HistoryVariant::Full => {
                        let day_label = date.format("%Y-%m-%d").to_string();
                        labels.insert(day_label, (close, currency.clone()));
                        // Daily rows arrive date-sorted, so the last close
                        // of the month wins here.
                        labels.insert(Month::from(date).short_label(), (close, currency));
                    }
                }
            }
            debug!("Loaded {} history labels for {}", labels.len(), symbol);
            raw.insert(symbol, labels);
        }

        let pivot = raw.get(PIVOT_SYMBOL).cloned().unwrap_or_default();
        let mut series = HashMap::new();
        for (symbol, labels) in raw {
            let mut aligned = BTreeMap::new();
            for (label, (price, currency)) in labels {
                let price = if symbol == PIVOT_SYMBOL {
                    price
                } else {
                    let rate = pivot.get(&label).map_or(fallback_usd_rate, |(p, _)| *p);
                    align_price(price, &currency, &default_currency, rate)
                };
                aligned.insert(label, price);
            }
            series.insert(symbol, aligned);
        }
        Ok(PriceHistory { series })
    }

    pub fn price_at(&self, symbol: &str, label: &str) -> Option<f64> {
        self.series.get(symbol)?.get(label).copied()
    }

    pub fn series(&self, symbol: &str) -> Option<&BTreeMap<String, f64>> {
        self.series.get(symbol)
    }

    /// Fails with the symbols that have no history series at all.
    pub fn verify(&self, symbols: &[String]) -> Result<(), MarketError> {
        let missing: Vec<String> = symbols
            .iter()
            .filter(|s| !self.series.contains_key(*s))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MarketError::MissingSymbols(missing))
        }
    }
}

fn parse_history_rows(
    symbol: &str,
    data: &str,
) -> Result<Vec<(NaiveDate, f64, String)>, MarketError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize::<HistoryRow>() {
        let row = row?;
        // Sheets export dates either ISO or US-style, sometimes with a
        // trailing timestamp.
        let token = row.date.split_whitespace().next().unwrap_or_default();
        let date = NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(token, "%m/%d/%Y"))
            .map_err(|_| MarketError::InvalidDate {
                symbol: symbol.to_string(),
                value: row.date.clone(),
            })?;
        rows.push((date, row.close, row.currency.to_uppercase()));
    }
    rows.sort_by_key(|(date, _, _)| *date);
    Ok(rows)
}
