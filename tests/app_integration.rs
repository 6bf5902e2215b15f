use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const TRANSACTIONS_CSV: &str = "\
type,date,quantity,fees,price,currency,symbol,exchange,platform,ex_rate,ex_fees
buy,2024-01-05,10,1,100,EUR,aaa,xetra,broker,1.0,0.0
buy,2024-02-10,5,0,20,USD,bbb,nyse,broker,1.1,0.5
sell,2024-03-15,2,0,110,EUR,aaa,xetra,broker,1.0,0.0
";

    pub const MARKET_CSV: &str = "\
symbol,price,currency
USD,0.9,EUR
AAA,120,EUR
BBB,25,USD
";

    pub const AAA_HISTORY_CSV: &str = "\
Date,Close,Currency
1/31/2024,100,EUR
2/29/2024,105,EUR
3/31/2024,110,EUR
";

    pub const BBB_HISTORY_CSV: &str = "\
Date,Close,Currency
1/31/2024,18,USD
2/29/2024,20,USD
3/31/2024,22,USD
";

    pub const USD_HISTORY_CSV: &str = "\
Date,Close,Currency
1/31/2024,0.92,EUR
2/29/2024,0.91,EUR
3/31/2024,0.90,EUR
";

    pub async fn mount_sheet(server: &MockServer, id: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/spreadsheets/d/{id}/export")))
            .and(query_param("format", "csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    pub async fn create_sheet_server() -> MockServer {
        let server = MockServer::start().await;
        mount_sheet(&server, "tx-sheet", TRANSACTIONS_CSV).await;
        mount_sheet(&server, "market-sheet", MARKET_CSV).await;
        mount_sheet(&server, "aaa-history", AAA_HISTORY_CSV).await;
        mount_sheet(&server, "bbb-history", BBB_HISTORY_CSV).await;
        mount_sheet(&server, "usd-history", USD_HISTORY_CSV).await;
        server
    }

    pub fn config_yaml(base_url: &str, generation_dir: &str) -> String {
        format!(
            r#"
currency: "EUR"
history_variant: lite
sheets:
  transactions: "tx-sheet"
  live_market: "market-sheet"
  history:
    aaa: "aaa-history"
    bbb: "bbb-history"
    usd: "usd-history"
providers:
  sheets:
    base_url: "{base_url}"
generation_dir: "{generation_dir}"
"#
        )
    }
}

#[test_log::test(tokio::test)]
async fn test_summary_command_with_mock_sheets() {
    let server = test_utils::create_sheet_server().await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let gen_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_content =
        test_utils::config_yaml(&server.uri(), gen_dir.path().to_str().unwrap());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = folio::run_command(
        folio::AppCommand::Summary,
        Some(config_file.path().to_str().unwrap()),
        true,
    )
    .await;
    assert!(
        result.is_ok(),
        "Summary command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_history_command_with_mock_sheets() {
    let server = test_utils::create_sheet_server().await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let gen_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_content =
        test_utils::config_yaml(&server.uri(), gen_dir.path().to_str().unwrap());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = folio::run_command(
        folio::AppCommand::History,
        Some(config_file.path().to_str().unwrap()),
        true,
    )
    .await;
    assert!(
        result.is_ok(),
        "History command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_report_command_writes_generated_files() {
    let server = test_utils::create_sheet_server().await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let gen_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_content =
        test_utils::config_yaml(&server.uri(), gen_dir.path().to_str().unwrap());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = folio::run_command(
        folio::AppCommand::Report,
        Some(config_file.path().to_str().unwrap()),
        true,
    )
    .await;
    assert!(
        result.is_ok(),
        "Report command failed with: {:?}",
        result.err()
    );

    let portfolio_csv = fs::read_to_string(gen_dir.path().join("portfolio.csv"))
        .expect("portfolio.csv should exist");
    info!("Generated portfolio:\n{portfolio_csv}");
    assert!(portfolio_csv.contains("AAA"));
    assert!(portfolio_csv.contains("BBB"));

    let totals_md =
        fs::read_to_string(gen_dir.path().join("total.md")).expect("total.md should exist");
    assert!(totals_md.starts_with("# Total"));

    let entries_md =
        fs::read_to_string(gen_dir.path().join("entries.md")).expect("entries.md should exist");
    assert!(entries_md.contains("| AAA | jan24 |"));
    assert!(entries_md.contains("| BBB | feb24 |"));
}

#[test_log::test(tokio::test)]
async fn test_runs_from_local_sheet_exports() {
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(
        data_dir.path().join("tx-sheet.csv"),
        test_utils::TRANSACTIONS_CSV,
    )
    .unwrap();
    fs::write(
        data_dir.path().join("market-sheet.csv"),
        test_utils::MARKET_CSV,
    )
    .unwrap();

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
currency: "EUR"
sheets:
  transactions: "tx-sheet"
  live_market: "market-sheet"
use_local_data: true
data_dir: "{}"
"#,
        data_dir.path().to_str().unwrap()
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = folio::run_command(
        folio::AppCommand::Summary,
        Some(config_file.path().to_str().unwrap()),
        true,
    )
    .await;
    assert!(
        result.is_ok(),
        "Local data run failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_market_symbol_fails_loudly() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_sheet(&server, "tx-sheet", test_utils::TRANSACTIONS_CSV).await;
    // BBB is traded but absent from the market sheet
    test_utils::mount_sheet(
        &server,
        "market-sheet",
        "symbol,price,currency\nUSD,0.9,EUR\nAAA,120,EUR\n",
    )
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let gen_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_content =
        test_utils::config_yaml(&server.uri(), gen_dir.path().to_str().unwrap());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = folio::run_command(
        folio::AppCommand::Summary,
        Some(config_file.path().to_str().unwrap()),
        true,
    )
    .await;
    let err = result.expect_err("missing symbol must fail the run");
    assert!(err.to_string().contains("BBB"), "got: {err}");
}
