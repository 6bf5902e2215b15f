use super::ui;
use crate::core::portfolio::{Holdings, Totals};

/// Renders the holdings as a table with the totals block underneath.
pub fn render(holdings: &Holdings, totals: &Totals, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Exchange"),
        ui::header_cell("Amount"),
        ui::header_cell("Price"),
        ui::header_cell("Break-even"),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell(&format!("Spending ({currency})")),
        ui::header_cell("Spend (%)"),
        ui::header_cell("Profit"),
        ui::header_cell("Profit (%)"),
    ]);

    for holding in holdings {
        table.add_row(vec![
            comfy_table::Cell::new(&holding.symbol),
            comfy_table::Cell::new(&holding.exchange),
            ui::value_cell(format!("{:.4}", holding.amount)),
            ui::value_cell(format!("{:.2}", holding.current_price)),
            ui::value_cell(format!("{:.2}", holding.break_even_price)),
            ui::value_cell(format!("{:.2}", holding.value)),
            ui::value_cell(format!("{:.2}", holding.spending)),
            ui::value_cell(format!("{:.2}", holding.spending_percent)),
            ui::value_cell(format!("{:.2}", holding.profit_net)),
            ui::change_cell(holding.profit_percent),
        ]);
    }

    let mut output = format!(
        "Portfolio: {}\n\n",
        ui::style_text("Holdings", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\nTotal Value ({}): {}",
        ui::style_text(currency, ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", totals.value), ui::StyleType::TotalValue)
    ));
    output.push_str(&format!(
        "\nSpending: {:.2} | Profit: {:.2} ({:.2}%) | Cash-out at 95%: {:.2}",
        totals.spending, totals.profit_net, totals.profit_percent, totals.cash_out
    ));
    output.push_str(&format!(
        "\nHeld for {} days ({:.1} months) | ROI per day/month/year: {:.4}% / {:.2}% / {:.2}%",
        totals.time_interval_days,
        totals.time_interval_months,
        totals.avg_day_roi,
        totals.avg_month_roi,
        totals.avg_year_roi
    ));
    output
}

/// Renders the per-symbol entry points.
pub fn render_entry_points(entry_points: &[(String, String)]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Symbol"), ui::header_cell("First buy")]);
    for (symbol, month) in entry_points {
        table.add_row(vec![
            comfy_table::Cell::new(symbol),
            ui::value_cell(month.clone()),
        ]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text("Entry Points", ui::StyleType::Title),
        table
    )
}
