use super::ui;
use crate::core::portfolio::MonthSeries;

/// Renders a month-labeled series as a two-column table.
pub fn render_series(title: &str, value_header: &str, series: &MonthSeries) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell(value_header),
    ]);
    for (label, value) in series {
        table.add_row(vec![
            comfy_table::Cell::new(label),
            ui::value_cell(format!("{value:.2}")),
        ]);
    }
    format!("{}\n\n{}", ui::style_text(title, ui::StyleType::Title), table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_series_lists_every_month() {
        let series = vec![
            ("jan24".to_string(), 1000.0),
            ("feb24".to_string(), 0.0),
            ("mar24".to_string(), 180.5),
        ];
        let output = render_series("Spending", "EUR", &series);
        assert!(output.contains("Spending"));
        assert!(output.contains("jan24"));
        assert!(output.contains("feb24"));
        assert!(output.contains("180.50"));
    }
}
