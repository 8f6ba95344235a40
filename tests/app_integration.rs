use std::fs;
use stockfolio::cli::portfolio::{Allocation, PortfolioOptions};
use stockfolio::cli::stocks::StocksOptions;
use stockfolio::core::{
    Industry, Portfolio, PriceFilter, RiskAnalyzer, Security, SortDirection, SortKey, SortState,
    Strategy,
};
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(industry: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/stocks"))
            .and(query_param("industry", industry))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(content: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        std::fs::write(config_file.path(), content).expect("Failed to write config file");
        config_file
    }
}

const TECH_STOCKS: &str = r#"[
    {
        "companyName": "Alpha Systems",
        "symbol": "ALP",
        "currentPrice": 100.0,
        "startQuarterPrice": 90.0,
        "month1Price": 92.0,
        "month2Price": 95.0,
        "month3Price": 98.0,
        "endQuarterPrice": 99.0,
        "priceGrowth": 11.1,
        "month1Growth": 1.0,
        "month2Growth": 2.0,
        "month3Growth": 3.0,
        "marketCap": 1000000000,
        "peRatio": 15,
        "quarterOverQuarterGrowth": 8.5,
        "industry": "technology"
    },
    {
        "companyName": "Beta Networks",
        "symbol": "BET",
        "currentPrice": 50.0,
        "startQuarterPrice": 55.0,
        "month1Price": 54.0,
        "month2Price": 52.0,
        "month3Price": 51.0,
        "endQuarterPrice": 50.5,
        "priceGrowth": -9.1,
        "month1Growth": 3.0,
        "month2Growth": 2.0,
        "month3Growth": 1.0,
        "marketCap": 2000000000,
        "peRatio": 25,
        "quarterOverQuarterGrowth": 4.0,
        "industry": "technology"
    },
    {
        "companyName": "Gamma Labs",
        "symbol": "GAM",
        "currentPrice": 12.0,
        "startQuarterPrice": 10.0,
        "month1Price": 10.5,
        "month2Price": 11.0,
        "month3Price": 11.5,
        "endQuarterPrice": 11.8,
        "priceGrowth": 20.0,
        "month1Growth": 2.0,
        "month2Growth": 2.0,
        "month3Growth": 2.0,
        "marketCap": 300000000,
        "quarterOverQuarterGrowth": 12.0,
        "industry": "technology"
    }
]"#;

#[test_log::test(tokio::test)]
async fn test_stocks_flow_with_mock() {
    let mock_server = test_utils::create_mock_server("technology", TECH_STOCKS).await;
    let config_file = test_utils::write_config(&format!(
        r#"
        providers:
          http:
            base_url: {}
        currency: "USD"
    "#,
        mock_server.uri()
    ));

    let command = stockfolio::AppCommand::Stocks(StocksOptions {
        industry: Some(Industry::Technology),
        filter: PriceFilter {
            min: Some(20.0),
            max: None,
        },
        sort: SortState::new(SortKey::PriceGrowth, SortDirection::Descending),
    });
    let result = stockfolio::run_command(command, Some(config_file.path().to_str().unwrap())).await;
    assert!(
        result.is_ok(),
        "Stocks command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_portfolio_flow_with_mock() {
    let mock_server = test_utils::create_mock_server("technology", TECH_STOCKS).await;
    let config_file = test_utils::write_config(&format!(
        r#"
        providers:
          http:
            base_url: {}
        total_investment: 15000
    "#,
        mock_server.uri()
    ));

    let command = stockfolio::AppCommand::Portfolio(PortfolioOptions {
        symbols: vec!["ALP".to_string(), "bet".to_string(), "GAM".to_string()],
        industry: Some(Industry::Technology),
        total_investment: None,
        allocation: Allocation::Strategy(Strategy::Aggressive),
        weights: vec![("GAM".to_string(), 10.0)],
    });
    let result = stockfolio::run_command(command, Some(config_file.path().to_str().unwrap())).await;
    assert!(
        result.is_ok(),
        "Portfolio command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_portfolio_flow_with_data_file() {
    let data_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(data_file.path(), TECH_STOCKS).expect("Failed to write data file");
    let config_file = test_utils::write_config(&format!(
        r#"
        providers:
          file:
            path: "{}"
    "#,
        data_file.path().display()
    ));

    let command = stockfolio::AppCommand::Portfolio(PortfolioOptions {
        symbols: vec!["ALP".to_string(), "BET".to_string()],
        ..Default::default()
    });
    let result = stockfolio::run_command(command, Some(config_file.path().to_str().unwrap())).await;
    assert!(
        result.is_ok(),
        "Portfolio command failed with: {:?}",
        result.err()
    );

    let unknown = stockfolio::AppCommand::Portfolio(PortfolioOptions {
        symbols: vec!["NOPE".to_string()],
        ..Default::default()
    });
    let result = stockfolio::run_command(unknown, Some(config_file.path().to_str().unwrap())).await;
    assert!(result.unwrap_err().to_string().contains("Unknown symbol"));
}

#[test_log::test(tokio::test)]
async fn test_industries_needs_no_config() {
    let result = stockfolio::run_command(
        stockfolio::AppCommand::Industries,
        Some("/definitely/not/a/config.yaml"),
    )
    .await;
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let command = stockfolio::AppCommand::Stocks(StocksOptions::default());
    let result = stockfolio::run_command(command, Some("/definitely/not/a/config.yaml")).await;
    assert!(result.unwrap_err().to_string().contains("Failed to read config file"));
}

#[test_log::test]
fn test_engine_and_analyzer_scenario() {
    let securities: Vec<Security> = serde_json::from_str(TECH_STOCKS).expect("Failed to parse");
    let pair = &securities[..2];

    let portfolio = Portfolio::initialize(pair, 10_000.0);
    let weights = portfolio.weights();
    info!(?weights, "Initialized portfolio");
    assert_eq!(weights, vec![50.0, 50.0]);
    assert_eq!(portfolio.position("ALP").unwrap().investment_amount, 5000.0);
    assert_eq!(portfolio.position("ALP").unwrap().shares, 50.0);
    assert_eq!(portfolio.position("BET").unwrap().shares, 100.0);

    let report = RiskAnalyzer::analyze(portfolio.positions(), &weights);
    assert_eq!(report.correlation.between("ALP", "BET"), Some(-1.0));
    assert_eq!(report.correlation.get(0, 0), Some(1.0));
    assert_eq!(report.diversification_score, 0.0);

    let conservative = portfolio.apply_strategy(Strategy::Conservative);
    let alp = conservative.position("ALP").unwrap().weight;
    let bet = conservative.position("BET").unwrap().weight;
    assert!((alp - 33.33).abs() < 0.01, "ALP weight {alp}");
    assert!((bet - 66.67).abs() < 0.01, "BET weight {bet}");

    // Gamma's growth samples are flat, so its correlations fall back to zero
    let report = RiskAnalyzer::analyze(&securities, &[40.0, 40.0, 20.0]);
    assert_eq!(report.correlation.between("GAM", "ALP"), Some(0.0));
    assert!(report.diversification_score > 0.0);
}
