use super::util::with_retry;
use crate::core::cache::Cache;
use crate::core::security::Security;
use crate::core::source::{StockProvider, retain_valid};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Fetches securities from a stock service exposing
/// `GET {base_url}/api/stocks?industry=<value>`.
pub struct HttpStockProvider {
    base_url: String,
    client: reqwest::Client,
    cache: Arc<Cache<String, Vec<Security>>>,
}

impl HttpStockProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, Vec<Security>>>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stockfolio/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            cache,
        })
    }

    fn industry_url(&self, industry: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/api/stocks", self.base_url),
            &[("industry", industry)],
        )
        .with_context(|| format!("Invalid stock service URL: {}", self.base_url))
    }
}

#[async_trait]
impl StockProvider for HttpStockProvider {
    #[instrument(name = "StockFetch", skip(self), fields(industry = %industry))]
    async fn fetch_by_industry(&self, industry: &str) -> Result<Vec<Security>> {
        let industry = industry.trim();
        if industry.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(cached) = self.cache.get(&industry.to_string()).await {
            return Ok(cached);
        }

        let url = self.industry_url(industry)?;
        debug!("Requesting stocks from {}", url);

        let response = with_retry(|| self.client.get(url.clone()).send(), 2, 250)
            .await
            .map_err(|e| anyhow!("Request error: {} for industry: {} URL: {}", e, industry, url))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Stock service has no industry {}", industry);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "Stock service returned {} for industry: {}",
                response.status(),
                industry
            ));
        }

        let response_text = response
            .text()
            .await
            .context("Failed to get response text")?;
        let records: Option<Vec<Security>> = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse stocks response"
                );
                return Err(e).context("Failed to parse stocks response");
            }
        };

        let securities = retain_valid(records.unwrap_or_default());
        debug!("Received {} securities for {}", securities.len(), industry);
        self.cache
            .put(industry.to_string(), securities.clone())
            .await;
        Ok(securities)
    }
}
