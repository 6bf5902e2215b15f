//! Projects the engine's maps into flat parallel series for charting.
//!
//! The plotting side consumes positional lists, so ordering matters: every
//! per-symbol series follows the holdings' first-seen order, and the
//! aggregate profit figure rides at the end of the profit series under the
//! `Total` label.

use crate::core::portfolio::{Holdings, MonthSeries, Totals};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    /// Spending share per symbol (%), holdings order.
    pub spending_percent: Vec<f64>,
    /// Profit per symbol (%), with the portfolio total appended.
    pub profit_percent: Vec<f64>,
    /// Monthly spending renormalized to percent of all-months spending.
    pub monthly_spending_percent: Vec<f64>,
    pub symbols: Vec<String>,
    /// `symbols` plus a trailing `Total` label, pairs with
    /// `profit_percent`.
    pub symbols_with_total: Vec<String>,
    pub months: Vec<String>,
}

impl ChartData {
    pub fn project(holdings: &Holdings, totals: &Totals, spending_history: &MonthSeries) -> Self {
        let mut chart = ChartData::default();

        for holding in holdings {
            chart.spending_percent.push(holding.spending_percent);
            chart.profit_percent.push(holding.profit_percent);
            chart.symbols.push(holding.symbol.clone());
        }
        chart.profit_percent.push(totals.profit_percent);
        chart.symbols_with_total = chart.symbols.clone();
        chart.symbols_with_total.push("Total".to_string());

        let month_total: f64 = spending_history.iter().map(|(_, spent)| spent).sum();
        for (label, spent) in spending_history {
            let percent = if month_total != 0.0 {
                100.0 * spent / month_total
            } else {
                0.0
            };
            chart.monthly_spending_percent.push(percent);
            chart.months.push(label.clone());
        }

        chart
    }
}
