pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::portfolio::PortfolioOptions;
use crate::cli::stocks::StocksOptions;
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::source::StockProvider;
use crate::providers::{FileStockProvider, HttpStockProvider};
use anyhow::{Result, bail};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Commands that need a loaded configuration.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Industries,
    Stocks(StocksOptions),
    Portfolio(PortfolioOptions),
}

/// Builds the stock source named in the configuration. A file source wins
/// over an HTTP one.
pub fn build_provider(config: &AppConfig) -> Result<Box<dyn StockProvider + Send + Sync>> {
    if let Some(file) = &config.providers.file {
        debug!("Using stock data file {}", file.path);
        return Ok(Box::new(FileStockProvider::load(&file.path)?));
    }
    if let Some(http) = &config.providers.http {
        debug!("Using stock service at {}", http.base_url);
        let cache = Arc::new(Cache::with_ttl(http.cache_ttl_secs.map(Duration::from_secs)));
        return Ok(Box::new(HttpStockProvider::new(&http.base_url, cache)?));
    }
    bail!("No stock provider configured; add providers.http or providers.file to the config")
}

fn load(config_path: Option<&str>) -> Result<(AppConfig, Box<dyn StockProvider + Send + Sync>)> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    let provider = build_provider(&config)?;
    Ok((config, provider))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Stockfolio starting...");

    match command {
        AppCommand::Industries => {
            cli::stocks::display_industries();
            Ok(())
        }
        AppCommand::Stocks(options) => {
            let (config, provider) = load(config_path)?;
            cli::stocks::run(provider.as_ref(), &options, &config.currency).await
        }
        AppCommand::Portfolio(options) => {
            let (config, provider) = load(config_path)?;
            cli::portfolio::run(
                provider.as_ref(),
                &options,
                config.total_investment,
                &config.currency,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{FileProviderConfig, ProvidersConfig};

    #[test]
    fn test_build_provider_requires_a_source() {
        let config = AppConfig {
            providers: ProvidersConfig {
                http: None,
                file: None,
            },
            ..AppConfig::default()
        };
        let err = build_provider(&config).err().expect("Expected an error");
        assert!(err.to_string().contains("No stock provider configured"));
    }

    #[test]
    fn test_build_provider_prefers_file() {
        let config = AppConfig {
            providers: ProvidersConfig {
                file: Some(FileProviderConfig {
                    path: "/no/such/stocks.json".to_string(),
                }),
                ..ProvidersConfig::default()
            },
            ..AppConfig::default()
        };
        // the file source is chosen even though http is configured too
        let err = build_provider(&config).err().expect("Expected an error");
        assert!(err.to_string().contains("Failed to read stock data file"));

        assert!(build_provider(&AppConfig::default()).is_ok());
    }
}
