//! Abstraction over where security records come from.

use crate::core::security::{Industry, Security};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

#[async_trait]
pub trait StockProvider: Send + Sync {
    /// Returns the securities tagged with `industry`.
    ///
    /// An unknown or empty industry yields an empty list rather than an error.
    async fn fetch_by_industry(&self, industry: &str) -> Result<Vec<Security>>;
}

/// Fetches every known industry concurrently and concatenates the results in
/// [`Industry::ALL`] order. The first failing industry aborts the fetch.
pub async fn fetch_all_industries(
    provider: &(dyn StockProvider + Send + Sync),
    on_fetched: &(dyn Fn(Industry) + Sync),
) -> Result<Vec<Security>> {
    let futures = Industry::ALL.into_iter().map(|industry| async move {
        let result = provider.fetch_by_industry(industry.value()).await;
        on_fetched(industry);
        result
    });

    let mut securities = Vec::new();
    for result in join_all(futures).await {
        securities.extend(result?);
    }
    debug!("Fetched {} securities across all industries", securities.len());
    Ok(securities)
}

/// Drops records that fail [`Security::validate`], logging each one.
pub fn retain_valid(records: Vec<Security>) -> Vec<Security> {
    records
        .into_iter()
        .filter(|s| match s.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Skipping invalid security record");
                false
            }
        })
        .collect()
}
