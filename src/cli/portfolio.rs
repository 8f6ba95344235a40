use super::stocks::fetch_securities;
use super::ui;
use crate::core::portfolio::{Portfolio, Strategy};
use crate::core::risk::{RiskAnalyzer, RiskReport};
use crate::core::screener::{PRICE_POINT_LABELS, PriceHistory, Selection, SelectionChange, price_history};
use crate::core::security::{Industry, Security};
use crate::core::source::StockProvider;
use anyhow::{Result, anyhow, bail};
use comfy_table::Cell;
use tracing::{debug, warn};

/// How the initial equal allocation is adjusted before manual weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Allocation {
    #[default]
    Equal,
    Strategy(Strategy),
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioOptions {
    pub symbols: Vec<String>,
    /// Restricts the lookup to one industry; `None` searches all of them.
    pub industry: Option<Industry>,
    /// Falls back to the configured amount.
    pub total_investment: Option<f64>,
    pub allocation: Allocation,
    /// Manual `(symbol, weight)` edits applied last, in order.
    pub weights: Vec<(String, f64)>,
}

/// Picks the requested symbols out of `available`, keeping the requested order.
///
/// Symbols match case-insensitively. Anything past the selection cap is
/// skipped with a warning; an unknown symbol is an error.
pub fn select_securities(available: &[Security], symbols: &[String]) -> Result<Selection> {
    let mut selection = Selection::new();
    for symbol in symbols {
        let security = available
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol.trim()))
            .ok_or_else(|| anyhow!("Unknown symbol: {}", symbol))?;
        if selection.contains(&security.symbol) {
            debug!("Ignoring duplicate symbol {}", security.symbol);
            continue;
        }
        if selection.toggle(security) == SelectionChange::Full {
            warn!(
                "At most {} stocks can be compared, skipping {}",
                crate::core::screener::MAX_SELECTION,
                security.symbol
            );
        }
    }
    Ok(selection)
}

/// Runs the allocation steps the user asked for, in the order a user would
/// apply them: equal split, optional strategy, then manual weight edits.
pub fn build_portfolio(securities: &[Security], total_investment: f64, options: &PortfolioOptions) -> Portfolio {
    let mut portfolio = Portfolio::initialize(securities, total_investment);
    if let Allocation::Strategy(strategy) = options.allocation {
        portfolio = portfolio.apply_strategy(strategy);
    }
    for (symbol, weight) in &options.weights {
        let symbol = portfolio
            .positions()
            .iter()
            .find(|p| p.symbol().eq_ignore_ascii_case(symbol))
            .map(|p| p.symbol().to_string());
        match symbol {
            Some(symbol) => portfolio = portfolio.set_weight(&symbol, *weight),
            None => warn!("No position to weight, ignoring weight {}", weight),
        }
    }
    portfolio
}

pub async fn run(
    provider: &(dyn StockProvider + Send + Sync),
    options: &PortfolioOptions,
    default_investment: f64,
    currency: &str,
) -> Result<()> {
    if options.symbols.is_empty() {
        bail!("Select at least one stock with --symbols");
    }

    let available = fetch_securities(provider, options.industry).await?;
    let selection = select_securities(&available, &options.symbols)?;
    let total_investment = options.total_investment.unwrap_or(default_investment);
    let portfolio = build_portfolio(selection.securities(), total_investment, options);
    let report = RiskAnalyzer::analyze(portfolio.positions(), &portfolio.weights());

    if let Some(history) = price_history(selection.securities()) {
        println!(
            "\n{}\n",
            ui::style_text("Price History", ui::StyleType::Title)
        );
        println!("{}", render_price_history(&history, currency));
    }

    println!(
        "\n{}\n",
        ui::style_text("Portfolio Builder", ui::StyleType::Title)
    );
    println!("{}", render_portfolio(&portfolio, currency));

    println!(
        "\n{}\n",
        ui::style_text("Risk Analysis", ui::StyleType::Title)
    );
    println!("{}", render_risk(&report));
    ui::print_separator();
    Ok(())
}

pub fn render_price_history(history: &PriceHistory, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Period")];
    header.extend(history.series.iter().map(|(symbol, _)| ui::header_cell(symbol)));
    table.set_header(header);

    for (i, label) in PRICE_POINT_LABELS.iter().enumerate() {
        let mut row = vec![Cell::new(label)];
        row.extend(
            history
                .series
                .iter()
                .map(|(_, prices)| ui::right_cell(ui::format_currency(prices[i], currency))),
        );
        table.add_row(row);
    }

    format!(
        "{table}\n{}",
        ui::style_text(
            &format!(
                "Range: {} to {}",
                ui::format_currency(history.min, currency),
                ui::format_currency(history.max, currency)
            ),
            ui::StyleType::Subtle
        )
    )
}

/// Positions table followed by the weight check and the summary figures.
pub fn render_portfolio(portfolio: &Portfolio, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Stock"),
        ui::header_cell("Weight (%)"),
        ui::header_cell(&format!("Amount ({currency})")),
        ui::header_cell("Shares"),
        ui::header_cell("Exp. Return"),
        ui::header_cell("Risk Score"),
    ]);

    for position in portfolio.positions() {
        table.add_row(vec![
            Cell::new(position.symbol()),
            ui::right_cell(format!("{:.2}", position.weight)),
            ui::right_cell(format!("{:.2}", position.investment_amount)),
            ui::right_cell(format!("{:.2}", position.shares)),
            ui::change_cell(position.expected_return),
            ui::right_cell(format!("{:.1}", position.risk_score)),
        ]);
    }

    let check = portfolio.weight_check();
    let mut out = format!(
        "{table}\n\n{} {}",
        ui::style_text("Total Weight:", ui::StyleType::TotalLabel),
        ui::format_percentage(check.total)
    );
    if !check.is_valid {
        out.push_str(&format!(
            "  {}",
            ui::style_text("Weights should sum to 100%", ui::StyleType::Warning)
        ));
    }

    let stats = portfolio.stats();
    let mut summary = ui::new_styled_table();
    summary.set_header(vec![
        ui::header_cell("Total Investment"),
        ui::header_cell("Expected Return"),
        ui::header_cell("Risk Score"),
        ui::header_cell("Sharpe Ratio"),
    ]);
    summary.add_row(vec![
        ui::right_cell(ui::format_currency(portfolio.total_investment(), currency)),
        ui::change_cell(stats.expected_return),
        ui::right_cell(format!("{:.1}", stats.risk_score)),
        ui::format_optional_cell(stats.sharpe_ratio, |s| format!("{s:.2}")),
    ]);
    out.push_str(&format!("\n\n{summary}"));
    out
}

/// Beta and diversification figures followed by the correlation matrix.
pub fn render_risk(report: &RiskReport) -> String {
    let mut summary = ui::new_styled_table();
    summary.set_header(vec![
        ui::header_cell("Portfolio Beta"),
        ui::header_cell("Diversification Score"),
    ]);
    summary.add_row(vec![
        ui::right_cell(format!("{:.2}", report.portfolio_beta)),
        ui::right_cell(format!("{:.2}", report.diversification_score)),
    ]);

    let mut betas = ui::new_styled_table();
    betas.set_header(vec![ui::header_cell("Stock"), ui::header_cell("Beta")]);
    for (symbol, beta) in &report.betas {
        betas.add_row(vec![Cell::new(symbol), ui::right_cell(format!("{beta:.2}"))]);
    }

    let mut matrix = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Stock")];
    header.extend(report.correlation.symbols().iter().map(|s| ui::header_cell(s)));
    matrix.set_header(header);
    for (symbol, row) in report.correlation.rows() {
        let mut cells = vec![Cell::new(symbol)];
        cells.extend(row.iter().map(|c| ui::correlation_cell(*c)));
        matrix.add_row(cells);
    }

    format!(
        "{summary}\n\n{betas}\n\n{}\n\n{matrix}",
        ui::style_text("Correlation Matrix", ui::StyleType::TotalLabel)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::security::fixtures::{pair, security};
    use crate::providers::FileStockProvider;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_securities_keeps_order_and_cap() {
        let available: Vec<Security> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|s| security(s, [1.0, 2.0, 3.0], 1e9, None))
            .collect();

        let selection = select_securities(&available, &symbols(&["c", "A", "a"])).unwrap();
        let picked: Vec<&str> = selection.securities().iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(picked, vec!["C", "A"]);

        let selection =
            select_securities(&available, &symbols(&["A", "B", "C", "D", "E", "F"])).unwrap();
        assert_eq!(selection.len(), 5);
        assert!(!selection.contains("F"));

        let err = select_securities(&available, &symbols(&["ZZZ"])).unwrap_err();
        assert!(err.to_string().contains("Unknown symbol"));
    }

    #[test]
    fn test_build_portfolio_applies_steps_in_order() {
        let options = PortfolioOptions {
            allocation: Allocation::Strategy(Strategy::Conservative),
            weights: vec![("b".to_string(), 50.0), ("nope".to_string(), 10.0)],
            ..Default::default()
        };
        let portfolio = build_portfolio(&pair(), 10_000.0, &options);

        let a = portfolio.position("A").unwrap().weight;
        assert!((a - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(portfolio.position("B").unwrap().weight, 50.0);
        assert!(!portfolio.weight_check().is_valid);
    }

    #[test]
    fn test_render_portfolio() {
        let portfolio = Portfolio::initialize(&pair(), 10_000.0);
        let output = render_portfolio(&portfolio, "USD");

        assert!(output.contains("5000.00"));
        assert!(output.contains("100.00%"));
        assert!(output.contains("Sharpe Ratio"));
        assert!(!output.contains("Weights should sum to 100%"));

        let skewed = portfolio.set_weight("A", 80.0);
        assert!(render_portfolio(&skewed, "USD").contains("Weights should sum to 100%"));

        let zeroed = portfolio.set_weight("A", 0.0).set_weight("B", 0.0);
        assert!(render_portfolio(&zeroed, "USD").contains("N/A"));
    }

    #[test]
    fn test_render_risk() {
        let portfolio = Portfolio::initialize(&pair(), 10_000.0);
        let report = RiskAnalyzer::analyze(portfolio.positions(), &portfolio.weights());
        let output = render_risk(&report);

        assert!(output.contains("Correlation Matrix"));
        assert!(output.contains("-1.00"));
        assert!(output.contains("1.00"));
    }

    #[tokio::test]
    async fn test_portfolio_command() {
        let provider = FileStockProvider::from_securities(pair());
        let options = PortfolioOptions {
            symbols: symbols(&["A", "B"]),
            industry: Some(Industry::Technology),
            total_investment: Some(20_000.0),
            allocation: Allocation::Strategy(Strategy::Balanced),
            weights: Vec::new(),
        };

        let result = run(&provider, &options, 10_000.0, "USD").await;
        assert!(result.is_ok());

        let empty = PortfolioOptions::default();
        assert!(run(&provider, &empty, 10_000.0, "USD").await.is_err());
    }
}
