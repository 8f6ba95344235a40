use crate::core::security::Security;
use crate::core::source::{StockProvider, retain_valid};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Serves securities from a local JSON dataset, an array of stock records
/// each carrying its `industry` tag.
#[derive(Debug)]
pub struct FileStockProvider {
    securities: Vec<Security>,
}

impl FileStockProvider {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read stock data file: {}", path.display()))?;
        let records: Vec<Security> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse stock data file: {}", path.display()))?;
        debug!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self::from_securities(records))
    }

    pub fn from_securities(records: Vec<Security>) -> Self {
        Self {
            securities: retain_valid(records),
        }
    }
}

#[async_trait]
impl StockProvider for FileStockProvider {
    async fn fetch_by_industry(&self, industry: &str) -> Result<Vec<Security>> {
        let industry = industry.trim();
        if industry.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .securities
            .iter()
            .filter(|s| s.industry.eq_ignore_ascii_case(industry))
            .cloned()
            .collect())
    }
}
