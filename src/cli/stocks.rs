use super::ui;
use crate::core::screener::{PriceFilter, SortState, best_performer, worst_performer};
use crate::core::security::{Industry, Security};
use crate::core::source::{StockProvider, fetch_all_industries};
use anyhow::Result;
use comfy_table::{Cell, Color};
use tracing::debug;

/// Options for the stock comparison listing.
#[derive(Debug, Clone, Default)]
pub struct StocksOptions {
    /// `None` lists every industry.
    pub industry: Option<Industry>,
    pub filter: PriceFilter,
    pub sort: SortState,
}

/// Loads securities for one industry, or all of them, behind a spinner.
pub async fn fetch_securities(
    provider: &(dyn StockProvider + Send + Sync),
    industry: Option<Industry>,
) -> Result<Vec<Security>> {
    match industry {
        Some(industry) => {
            let pb = ui::new_spinner(&format!("Fetching {industry} stocks..."));
            let result = provider.fetch_by_industry(industry.value()).await;
            pb.finish_and_clear();
            result
        }
        None => {
            let pb = ui::new_spinner("Fetching stocks for all industries...");
            let result = fetch_all_industries(provider, &|industry| {
                pb.set_message(format!("Fetched {}", industry.label()));
            })
            .await;
            pb.finish_and_clear();
            result
        }
    }
}

pub async fn run(
    provider: &(dyn StockProvider + Send + Sync),
    options: &StocksOptions,
    currency: &str,
) -> Result<()> {
    let securities = fetch_securities(provider, options.industry).await?;
    let filtered = options.filter.apply(&securities);
    debug!(
        "{} of {} securities pass the price filter",
        filtered.len(),
        securities.len()
    );
    if let Some((key, direction)) = options.sort.active() {
        debug!(%key, ?direction, "Sorting stocks");
    }
    let sorted = options.sort.sorted(&filtered);

    let title = options
        .industry
        .map_or("All Industries", |i| i.label());
    println!("\n{}\n", ui::style_text(title, ui::StyleType::Title));

    if sorted.is_empty() {
        println!("No stocks found.");
        return Ok(());
    }

    println!("{}", render_stocks_table(&sorted, currency));
    if let Some((best, worst)) = performers(&sorted) {
        println!(
            "\n{} {} ({})   {} {} ({})",
            ui::style_text("Best performer:", ui::StyleType::TotalLabel),
            best.symbol,
            ui::format_percentage(best.price_growth),
            ui::style_text("Worst performer:", ui::StyleType::TotalLabel),
            worst.symbol,
            ui::format_percentage(worst.price_growth),
        );
    }
    ui::print_separator();
    Ok(())
}

/// Best and worst performer of the rows as listed. Ties go to the later row,
/// so callers must pass the same ordering they display.
pub fn performers(securities: &[Security]) -> Option<(&Security, &Security)> {
    Some((best_performer(securities)?, worst_performer(securities)?))
}

/// Renders the comparison table. The best and worst performers of the listed
/// rows are marked with an arrow next to the company name.
pub fn render_stocks_table(securities: &[Security], currency: &str) -> String {
    let (best, worst) = performers(securities)
        .map(|(b, w)| (Some(b.symbol.as_str()), Some(w.symbol.as_str())))
        .unwrap_or_default();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Company"),
        ui::header_cell("Current Price"),
        ui::header_cell("Start Quarter"),
        ui::header_cell("End Quarter"),
        ui::header_cell("Growth %"),
        ui::header_cell("Market Cap"),
        ui::header_cell("P/E"),
        ui::header_cell("QoQ Growth"),
    ]);

    for security in securities {
        let symbol = security.symbol.as_str();
        let name = if Some(symbol) == best {
            Cell::new(format!("{} ▲", security.company_name)).fg(Color::Green)
        } else if Some(symbol) == worst {
            Cell::new(format!("{} ▼", security.company_name)).fg(Color::Red)
        } else {
            Cell::new(&security.company_name)
        };

        table.add_row(vec![
            Cell::new(symbol),
            name,
            ui::right_cell(ui::format_currency(security.current_price, currency)),
            ui::right_cell(ui::format_currency(security.start_quarter_price, currency)),
            ui::right_cell(ui::format_currency(security.end_quarter_price, currency)),
            ui::change_cell(security.price_growth),
            ui::right_cell(ui::format_market_cap(security.market_cap)),
            ui::format_optional_cell(security.known_pe_ratio(), |pe| format!("{pe:.1}")),
            ui::change_cell(security.quarter_over_quarter_growth),
        ]);
    }

    table.to_string()
}

pub fn display_industries() {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Industry"), ui::header_cell("Value")]);
    for industry in Industry::ALL {
        table.add_row(vec![Cell::new(industry.label()), Cell::new(industry.value())]);
    }
    println!("{table}");
}
