//! The transaction ledger: typed rows and the ordered log they form.

use crate::core::month::Month;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("unknown transaction type: {0}")]
    UnknownKind(String),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("failed to read transaction rows")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    Watch,
    Buy,
    Sell,
    Convert,
    Transfer,
    Deposit,
    Withdraw,
}

impl FromStr for TxKind {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "watch" => Ok(TxKind::Watch),
            "buy" => Ok(TxKind::Buy),
            "sell" => Ok(TxKind::Sell),
            "convert" => Ok(TxKind::Convert),
            "transfer" => Ok(TxKind::Transfer),
            "deposit" => Ok(TxKind::Deposit),
            "withdraw" => Ok(TxKind::Withdraw),
            other => Err(TransactionError::UnknownKind(other.to_string())),
        }
    }
}

impl Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TxKind::Watch => "watch",
            TxKind::Buy => "buy",
            TxKind::Sell => "sell",
            TxKind::Convert => "convert",
            TxKind::Transfer => "transfer",
            TxKind::Deposit => "deposit",
            TxKind::Withdraw => "withdraw",
        };
        write!(f, "{name}")
    }
}

/// One ledger entry. Immutable after construction; `new` enforces the
/// numeric invariants (`ex_rate` is later used as a divisor).
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub kind: TxKind,
    pub date: NaiveDate,
    pub quantity: f64,
    pub fees: f64,
    pub price: f64,
    pub currency: String,
    pub symbol: String,
    pub exchange: String,
    pub wallet: String,
    pub ex_rate: f64,
    pub ex_fees: f64,
}

#[allow(clippy::too_many_arguments)]
impl Transaction {
    pub fn new(
        kind: TxKind,
        date: NaiveDate,
        quantity: f64,
        fees: f64,
        price: f64,
        currency: &str,
        symbol: &str,
        exchange: &str,
        wallet: &str,
        ex_rate: f64,
        ex_fees: f64,
    ) -> Result<Self, TransactionError> {
        let invalid = |field: &'static str, value: f64| TransactionError::InvalidField {
            field,
            reason: format!("{value} in {kind} of {symbol} on {date}"),
        };
        if !(quantity >= 0.0) {
            return Err(invalid("quantity", quantity));
        }
        if !(fees >= 0.0) {
            return Err(invalid("fees", fees));
        }
        if !(price >= 0.0) {
            return Err(invalid("price", price));
        }
        if !(ex_rate > 0.0) {
            return Err(invalid("ex_rate", ex_rate));
        }
        if !(ex_fees >= 0.0) {
            return Err(invalid("ex_fees", ex_fees));
        }
        Ok(Transaction {
            kind,
            date,
            quantity,
            fees,
            price,
            currency: currency.to_uppercase(),
            symbol: symbol.to_uppercase(),
            exchange: exchange.to_string(),
            wallet: wallet.to_string(),
            ex_rate,
            ex_fees,
        })
    }

    /// Net cost in the run's default currency: unit price times quantity
    /// plus all fees, divided by the exchange rate.
    pub fn net_cost(&self) -> f64 {
        (self.price * self.quantity + self.fees + self.ex_fees) / self.ex_rate
    }

    pub fn month(&self) -> Month {
        Month::from(self.date)
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}::{} at {} {} with extra {}, {} and {} on {} to {}",
            self.kind,
            self.quantity,
            self.exchange,
            self.symbol,
            self.price,
            self.currency,
            self.fees,
            self.ex_rate,
            self.ex_fees,
            self.date,
            self.wallet
        )
    }
}

/// Raw CSV row as exported from the transactions sheet. `platform` and
/// `wallet` are interchangeable header names; `ex_rate`/`ex_fees` may be
/// blank.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "type")]
    kind: String,
    date: String,
    quantity: f64,
    fees: f64,
    price: f64,
    currency: String,
    symbol: String,
    exchange: String,
    #[serde(alias = "wallet")]
    platform: String,
    ex_rate: Option<f64>,
    ex_fees: Option<f64>,
}

/// Append-only ordered sequence of transactions. Insertion order is
/// significant: the valuation replay follows it, and first-seen symbol
/// order drives display ordering downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Parses the CSV export of the transactions sheet.
    pub fn from_csv_str(data: &str) -> Result<Self, TransactionError> {
        let mut log = TransactionLog::new();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        for row in reader.deserialize::<RawRow>() {
            let row = row?;
            let kind: TxKind = row.kind.parse()?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                TransactionError::InvalidField {
                    field: "date",
                    reason: format!("{}: {e}", row.date),
                }
            })?;
            log.push(Transaction::new(
                kind,
                date,
                row.quantity,
                row.fees,
                row.price,
                &row.currency,
                &row.symbol,
                &row.exchange,
                &row.platform,
                row.ex_rate.unwrap_or(1.0),
                row.ex_fees.unwrap_or(0.0),
            )?);
        }
        debug!("Parsed {} transactions", log.len());
        Ok(log)
    }

    /// Distinct symbols in first-seen order.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for transaction in &self.transactions {
            if !symbols.contains(&transaction.symbol) {
                symbols.push(transaction.symbol.clone());
            }
        }
        symbols
    }

    /// Transactions dated in the given calendar month, in log order.
    pub fn in_month(&self, month: Month) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |t| t.month() == month)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().map(|t| t.date).min()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().map(|t| t.date).max()
    }

    /// Log entries sorted by date ascending; entries sharing a date keep
    /// their log order.
    pub fn sorted_by_date(&self) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = self.transactions.iter().collect();
        sorted.sort_by_key(|t| t.date);
        sorted
    }

    /// Rewrites symbols through the configured alias map. The map is an
    /// explicit value owned by the caller; keys are matched
    /// case-insensitively.
    pub fn normalize_symbols(&mut self, aliases: &HashMap<String, String>) {
        if aliases.is_empty() {
            return;
        }
        for transaction in &mut self.transactions {
            if let Some(standard) = aliases.get(&transaction.symbol.to_lowercase()) {
                transaction.symbol = standard.to_uppercase();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy(symbol: &str, date: &str, quantity: f64) -> Transaction {
        Transaction::new(
            TxKind::Buy,
            date.parse().unwrap(),
            quantity,
            0.0,
            10.0,
            "EUR",
            symbol,
            "xetra",
            "broker",
            1.0,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn test_kind_parsing_is_case_insensitive() {
        assert_eq!("BUY".parse::<TxKind>().unwrap(), TxKind::Buy);
        assert_eq!("Sell".parse::<TxKind>().unwrap(), TxKind::Sell);
        assert_eq!("watch".parse::<TxKind>().unwrap(), TxKind::Watch);
        assert!("short".parse::<TxKind>().is_err());
    }

    #[test]
    fn test_invariants_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let tx = Transaction::new(
            TxKind::Buy,
            date,
            -1.0,
            0.0,
            10.0,
            "EUR",
            "aaa",
            "x",
            "w",
            1.0,
            0.0,
        );
        assert!(tx.is_err());
        let tx = Transaction::new(
            TxKind::Buy,
            date,
            1.0,
            0.0,
            10.0,
            "EUR",
            "aaa",
            "x",
            "w",
            0.0,
            0.0,
        );
        assert!(tx.is_err(), "zero ex_rate must be rejected");
    }

    #[test]
    fn test_symbol_is_uppercased() {
        let tx = buy("btc", "2024-01-05", 1.0);
        assert_eq!(tx.symbol, "BTC");
    }

    #[test]
    fn test_net_cost() {
        let tx = Transaction::new(
            TxKind::Buy,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            10.0,
            1.0,
            100.0,
            "USD",
            "AAA",
            "nyse",
            "broker",
            2.0,
            3.0,
        )
        .unwrap();
        assert!((tx.net_cost() - 502.0).abs() < 1e-9);
    }

    #[test]
    fn test_csv_parsing_with_defaults() {
        let data = "\
type,date,quantity,fees,price,currency,symbol,exchange,platform,ex_rate,ex_fees
buy,2024-01-05,10,1,100,EUR,aaa,xetra,broker,1.0,0.0
sell,2024-02-05,5,0,110,EUR,aaa,xetra,broker,,
";
        let log = TransactionLog::from_csv_str(data).unwrap();
        assert_eq!(log.len(), 2);
        let second = log.iter().nth(1).unwrap();
        assert_eq!(second.kind, TxKind::Sell);
        assert_eq!(second.ex_rate, 1.0);
        assert_eq!(second.ex_fees, 0.0);
    }

    #[test]
    fn test_csv_accepts_wallet_header() {
        let data = "\
type,date,quantity,fees,price,currency,symbol,exchange,wallet,ex_rate,ex_fees
buy,2024-01-05,10,1,100,EUR,aaa,xetra,cold-storage,1.0,0.0
";
        let log = TransactionLog::from_csv_str(data).unwrap();
        assert_eq!(log.iter().next().unwrap().wallet, "cold-storage");
    }

    #[test]
    fn test_csv_rejects_bad_date() {
        let data = "\
type,date,quantity,fees,price,currency,symbol,exchange,platform,ex_rate,ex_fees
buy,05/01/2024,10,1,100,EUR,aaa,xetra,broker,1.0,0.0
";
        assert!(TransactionLog::from_csv_str(data).is_err());
    }

    #[test]
    fn test_symbols_first_seen_order() {
        let mut log = TransactionLog::new();
        log.push(buy("bbb", "2024-01-05", 1.0));
        log.push(buy("aaa", "2024-01-06", 1.0));
        log.push(buy("bbb", "2024-01-07", 1.0));
        assert_eq!(log.symbols(), vec!["BBB", "AAA"]);
    }

    #[test]
    fn test_in_month_filter() {
        let mut log = TransactionLog::new();
        log.push(buy("aaa", "2024-01-05", 1.0));
        log.push(buy("aaa", "2024-02-05", 2.0));
        log.push(buy("aaa", "2024-01-20", 3.0));
        let january = Month::new(2024, 1).unwrap();
        let quantities: Vec<f64> = log.in_month(january).map(|t| t.quantity).collect();
        assert_eq!(quantities, vec![1.0, 3.0]);
    }

    #[test]
    fn test_date_bounds() {
        let mut log = TransactionLog::new();
        assert_eq!(log.first_date(), None);
        log.push(buy("aaa", "2024-03-05", 1.0));
        log.push(buy("aaa", "2024-01-05", 1.0));
        log.push(buy("aaa", "2024-02-05", 1.0));
        assert_eq!(
            log.first_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
        assert_eq!(
            log.last_date(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }

    #[test]
    fn test_sorted_by_date_is_stable() {
        let mut log = TransactionLog::new();
        let mut first = buy("aaa", "2024-01-05", 1.0);
        first.exchange = "first".to_string();
        let mut second = buy("bbb", "2024-01-05", 1.0);
        second.exchange = "second".to_string();
        log.push(first);
        log.push(second);
        let sorted = log.sorted_by_date();
        assert_eq!(sorted[0].exchange, "first");
        assert_eq!(sorted[1].exchange, "second");
    }

    #[test]
    fn test_normalize_symbols() {
        let mut log = TransactionLog::new();
        log.push(buy("iwda", "2024-01-05", 1.0));
        log.push(buy("btc", "2024-01-06", 1.0));
        let aliases = HashMap::from([("iwda".to_string(), "IWDA.AS".to_string())]);
        log.normalize_symbols(&aliases);
        assert_eq!(log.symbols(), vec!["IWDA.AS", "BTC"]);
    }
}
