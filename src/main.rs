use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stockfolio::cli::portfolio::{Allocation, PortfolioOptions};
use stockfolio::cli::stocks::StocksOptions;
use stockfolio::core::log::init_logging;
use stockfolio::core::{Industry, PriceFilter, SortDirection, SortKey, SortState, Strategy};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the industries stocks can be filtered by
    Industries,
    /// Compare the stocks of an industry
    Stocks {
        /// Industry to list; all industries when omitted
        #[arg(short, long, value_parser = parse_industry)]
        industry: Option<Industry>,
        /// Hide stocks priced below this amount
        #[arg(long)]
        min_price: Option<f64>,
        /// Hide stocks priced above this amount
        #[arg(long)]
        max_price: Option<f64>,
        /// Sort by symbol, name, price, growth, market-cap or qoq
        #[arg(short, long, value_parser = parse_sort_key)]
        sort: Option<SortKey>,
        /// Sort in descending order
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Build a weighted portfolio from up to five stocks
    Portfolio {
        /// Comma separated symbols, e.g. AAPL,MSFT
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        /// Industry to look the symbols up in; all industries when omitted
        #[arg(short, long, value_parser = parse_industry)]
        industry: Option<Industry>,
        /// Amount to invest; defaults to the configured total
        #[arg(long)]
        investment: Option<f64>,
        /// Allocation strategy: aggressive, conservative or balanced
        #[arg(long, value_parser = parse_strategy, conflicts_with = "equal")]
        strategy: Option<Strategy>,
        /// Split the investment equally (the default)
        #[arg(long)]
        equal: bool,
        /// Manual weight override, e.g. --weight AAPL=40
        #[arg(short, long = "weight", value_parser = parse_weight)]
        weights: Vec<(String, f64)>,
    },
}

impl From<Commands> for stockfolio::AppCommand {
    fn from(cmd: Commands) -> stockfolio::AppCommand {
        match cmd {
            Commands::Industries => stockfolio::AppCommand::Industries,
            Commands::Stocks {
                industry,
                min_price,
                max_price,
                sort,
                desc,
            } => {
                let direction = if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                stockfolio::AppCommand::Stocks(StocksOptions {
                    industry,
                    filter: PriceFilter {
                        min: min_price,
                        max: max_price,
                    },
                    sort: sort.map_or_else(SortState::default, |key| SortState::new(key, direction)),
                })
            }
            Commands::Portfolio {
                symbols,
                industry,
                investment,
                strategy,
                equal: _,
                weights,
            } => stockfolio::AppCommand::Portfolio(PortfolioOptions {
                symbols,
                industry,
                total_investment: investment,
                allocation: strategy.map_or(Allocation::Equal, Allocation::Strategy),
                weights,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn parse_industry(s: &str) -> Result<Industry, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (symbol, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected SYMBOL=WEIGHT, got '{s}'"))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("Invalid weight '{weight}': {e}"))?;
    Ok((symbol.trim().to_string(), weight))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => stockfolio::cli::setup::setup(),
        Some(cmd) => stockfolio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
