//! Writers for the generated report files: the holdings CSV and the
//! Markdown summaries.

use crate::core::portfolio::{Holdings, Totals};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const PORTFOLIO_FILE: &str = "portfolio.csv";
pub const TOTAL_FILE: &str = "total.md";
pub const ENTRIES_FILE: &str = "entries.md";

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// One row per holding, columns in the order downstream consumers expect.
pub fn write_portfolio_csv(path: &Path, holdings: &Holdings) -> Result<()> {
    ensure_parent(path)?;
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record([
            "symbol",
            "exchange",
            "amount",
            "value",
            "spending",
            "spending_percent",
            "profit_net",
            "profit_percent",
            "current_price",
            "break_even_price",
            "price25",
            "price50",
            "price75",
            "price100",
            "price150",
        ])
        .context("Failed to write portfolio header")?;
    for h in holdings {
        writer
            .write_record([
                h.symbol.clone(),
                h.exchange.clone(),
                h.amount.to_string(),
                h.value.to_string(),
                h.spending.to_string(),
                h.spending_percent.to_string(),
                h.profit_net.to_string(),
                h.profit_percent.to_string(),
                h.current_price.to_string(),
                h.break_even_price.to_string(),
                h.price25.to_string(),
                h.price50.to_string(),
                h.price75.to_string(),
                h.price100.to_string(),
                h.price150.to_string(),
            ])
            .with_context(|| format!("Failed to write portfolio row for {}", h.symbol))?;
    }
    writer.flush().context("Failed to flush portfolio CSV")?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn write_markdown_table(
    path: &Path,
    title: &str,
    col1: &str,
    col2: &str,
    rows: &[(String, String)],
) -> Result<()> {
    ensure_parent(path)?;
    let mut output = format!("# {title}\n\n| {col1} | {col2} |\n|--------|-------|\n");
    for (key, value) in rows {
        output.push_str(&format!("| {key} | {value} |\n"));
    }
    fs::write(path, output).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

pub fn write_totals_md(path: &Path, totals: &Totals) -> Result<()> {
    let rows = vec![
        ("Value".to_string(), format!("{:.2}", totals.value)),
        ("Spending".to_string(), format!("{:.2}", totals.spending)),
        ("Profit net".to_string(), format!("{:.2}", totals.profit_net)),
        (
            "Profit percent".to_string(),
            format!("{:.2}", totals.profit_percent),
        ),
        ("Cash out".to_string(), format!("{:.2}", totals.cash_out)),
        (
            "Time interval days".to_string(),
            totals.time_interval_days.to_string(),
        ),
        (
            "Time interval months".to_string(),
            format!("{:.2}", totals.time_interval_months),
        ),
        (
            "Time interval years".to_string(),
            format!("{:.2}", totals.time_interval_years),
        ),
        (
            "Avg day roi".to_string(),
            format!("{:.4}", totals.avg_day_roi),
        ),
        (
            "Avg month roi".to_string(),
            format!("{:.4}", totals.avg_month_roi),
        ),
        (
            "Avg year roi".to_string(),
            format!("{:.4}", totals.avg_year_roi),
        ),
    ];
    write_markdown_table(path, "Total", "Metric", "Value", &rows)
}

pub fn write_entry_points_md(path: &Path, entry_points: &[(String, String)]) -> Result<()> {
    let rows: Vec<(String, String)> = entry_points.to_vec();
    write_markdown_table(path, "Entry Points", "Symbol", "Date", &rows)
}
