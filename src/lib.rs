pub mod cli;
pub mod core;
pub mod providers;
pub mod report;

use crate::cli::ui;
use crate::core::chart::ChartData;
use crate::core::config::AppConfig;
use crate::core::market::{PIVOT_SYMBOL, PriceHistory, PriceSnapshot};
use crate::core::portfolio::{MonthSeries, Portfolio};
use crate::core::transaction::TransactionLog;
use crate::providers::{GoogleSheetSource, LocalSheetSource, SheetSource};
use anyhow::{Context, Result, bail};
use futures::future::join_all;
use tracing::{debug, info};

pub enum AppCommand {
    Summary,
    History,
    Report,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    quiet: bool,
) -> Result<()> {
    info!("Portfolio tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let source: Box<dyn SheetSource> = if config.use_local_data {
        let data_dir = config.data_dir.clone().unwrap_or_default();
        Box::new(LocalSheetSource::new(data_dir))
    } else {
        Box::new(GoogleSheetSource::new(config.sheets_base_url()))
    };

    let log = load_transactions(source.as_ref(), &config).await?;
    let snapshot = load_snapshot(source.as_ref(), &config, &log).await?;
    let portfolio = Portfolio::new(&log, &snapshot);

    match command {
        AppCommand::Summary => {
            let (holdings, totals) = portfolio.calculate()?;
            let entry_points = portfolio.entry_points();
            if !quiet {
                println!(
                    "{}",
                    cli::summary::render(&holdings, &totals, &config.currency)
                );
                ui::print_separator();
                println!("{}", cli::summary::render_entry_points(&entry_points));
            }
        }
        AppCommand::History => {
            let (holdings, totals) = portfolio.calculate()?;
            let spending = portfolio.spending_history()?;
            let history = load_history(source.as_ref(), &config, &log, &snapshot).await?;
            let valuation = portfolio.historical_valuation(&history)?;
            let chart = ChartData::project(&holdings, &totals, &spending);
            if !quiet {
                println!(
                    "{}",
                    cli::history::render_series("Spending Per Month", &config.currency, &spending)
                );
                let percents: MonthSeries = chart
                    .months
                    .iter()
                    .cloned()
                    .zip(chart.monthly_spending_percent.iter().copied())
                    .collect();
                ui::print_separator();
                println!(
                    "{}",
                    cli::history::render_series("Spending Per Month (%)", "% of total", &percents)
                );
                ui::print_separator();
                println!(
                    "{}",
                    cli::history::render_series(
                        "Historical Valuation",
                        &config.currency,
                        &valuation
                    )
                );
            }
        }
        AppCommand::Report => {
            let (holdings, totals) = portfolio.calculate()?;
            let entry_points = portfolio.entry_points();
            let gen_dir = config.generation_path();
            report::write_portfolio_csv(&gen_dir.join(report::PORTFOLIO_FILE), &holdings)?;
            report::write_totals_md(&gen_dir.join(report::TOTAL_FILE), &totals)?;
            report::write_entry_points_md(&gen_dir.join(report::ENTRIES_FILE), &entry_points)?;
            info!("Reports written to {}", gen_dir.display());
            if !quiet {
                println!("Reports written to {}", gen_dir.display());
            }
        }
    }

    Ok(())
}

async fn load_transactions(source: &dyn SheetSource, config: &AppConfig) -> Result<TransactionLog> {
    let data = source
        .fetch_csv(&config.sheets.transactions)
        .await
        .context("Failed to fetch transactions sheet")?;
    let mut log =
        TransactionLog::from_csv_str(&data).context("Failed to parse transactions sheet")?;
    log.normalize_symbols(&config.symbol_aliases);
    if log.is_empty() {
        bail!("Transactions sheet has no rows");
    }
    for tx in log.iter() {
        debug!("{tx}");
    }
    Ok(log)
}

async fn load_snapshot(
    source: &dyn SheetSource,
    config: &AppConfig,
    log: &TransactionLog,
) -> Result<PriceSnapshot> {
    let data = source
        .fetch_csv(&config.sheets.live_market)
        .await
        .context("Failed to fetch live market sheet")?;
    let snapshot = PriceSnapshot::from_csv_str(&data, &config.currency)?;
    let mut symbols = log.symbols();
    symbols.push(PIVOT_SYMBOL.to_string());
    snapshot.verify(&symbols)?;
    debug!("Pivot rate: 1 USD = {} EUR", snapshot.usd_rate());
    Ok(snapshot)
}

async fn load_history(
    source: &dyn SheetSource,
    config: &AppConfig,
    log: &TransactionLog,
    snapshot: &PriceSnapshot,
) -> Result<PriceHistory> {
    let pb = ui::new_progress_bar(config.sheets.history.len() as u64, true);
    pb.set_message("Fetching price history...");

    let history_futures = config.sheets.history.iter().map(|(symbol, id)| {
        let pb_clone = pb.clone();
        async move {
            let res = source.fetch_csv(id).await;
            pb_clone.inc(1);
            (symbol.clone(), res)
        }
    });
    let results = join_all(history_futures).await;
    pb.finish_and_clear();

    let mut sources_csv = Vec::new();
    for (symbol, res) in results {
        let data = res.with_context(|| format!("Failed to fetch history for {symbol}"))?;
        sources_csv.push((symbol, data));
    }

    let history = PriceHistory::from_sources(
        &sources_csv,
        config.history_variant,
        &config.currency,
        snapshot.usd_rate(),
    )?;
    history.verify(&log.symbols())?;
    Ok(history)
}
