//! Security records and the industry catalogue used to look them up.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A listed stock with its quarter price history and fundamentals.
///
/// Records arrive from a [`crate::core::StockProvider`] and are read-only
/// for the rest of the program. Growth figures are signed percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub start_quarter_price: f64,
    pub month1_price: f64,
    pub month2_price: f64,
    pub month3_price: f64,
    pub end_quarter_price: f64,
    pub price_growth: f64,
    pub month1_growth: f64,
    pub month2_growth: f64,
    pub month3_growth: f64,
    pub quarter_over_quarter_growth: f64,
    pub market_cap: f64,
    /// `None` or a non-positive value both mean "unknown".
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub industry: String,
}

impl Security {
    /// Returns the P/E ratio only when it is a known, positive number.
    pub fn known_pe_ratio(&self) -> Option<f64> {
        self.pe_ratio.filter(|pe| pe.is_finite() && *pe > 0.0)
    }

    /// The three monthly growth samples, in month order.
    pub fn monthly_growths(&self) -> [f64; 3] {
        [self.month1_growth, self.month2_growth, self.month3_growth]
    }

    /// Checks that all prices and the market cap are positive finite numbers
    /// and that growth figures are finite.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            bail!("Security has an empty symbol");
        }

        let prices = [
            ("currentPrice", self.current_price),
            ("startQuarterPrice", self.start_quarter_price),
            ("month1Price", self.month1_price),
            ("month2Price", self.month2_price),
            ("month3Price", self.month3_price),
            ("endQuarterPrice", self.end_quarter_price),
            ("marketCap", self.market_cap),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                bail!("{}: {name} must be a positive number, got {value}", self.symbol);
            }
        }

        let growths = [
            ("priceGrowth", self.price_growth),
            ("month1Growth", self.month1_growth),
            ("month2Growth", self.month2_growth),
            ("month3Growth", self.month3_growth),
            ("quarterOverQuarterGrowth", self.quarter_over_quarter_growth),
        ];
        for (name, value) in growths {
            if !value.is_finite() {
                bail!("{}: {name} must be finite, got {value}", self.symbol);
            }
        }
        Ok(())
    }
}

impl AsRef<Security> for Security {
    fn as_ref(&self) -> &Security {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Technology,
    Healthcare,
    Finance,
    Consumer,
    Energy,
    Telecom,
    RealEstate,
    Materials,
    Utilities,
}

impl Industry {
    pub const ALL: [Industry; 9] = [
        Industry::Technology,
        Industry::Healthcare,
        Industry::Finance,
        Industry::Consumer,
        Industry::Energy,
        Industry::Telecom,
        Industry::RealEstate,
        Industry::Materials,
        Industry::Utilities,
    ];

    /// Value sent to the stock service in the `industry` query parameter.
    pub fn value(&self) -> &'static str {
        match self {
            Industry::Technology => "technology",
            Industry::Healthcare => "healthcare",
            Industry::Finance => "finance",
            Industry::Consumer => "consumer",
            Industry::Energy => "energy",
            Industry::Telecom => "telecom",
            Industry::RealEstate => "real_estate",
            Industry::Materials => "materials",
            Industry::Utilities => "utilities",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Industry::Technology => "Technology",
            Industry::Healthcare => "Healthcare",
            Industry::Finance => "Finance",
            Industry::Consumer => "Consumer Goods",
            Industry::Energy => "Energy",
            Industry::Telecom => "Telecommunications",
            Industry::RealEstate => "Real Estate",
            Industry::Materials => "Materials",
            Industry::Utilities => "Utilities",
        }
    }
}

impl Display for Industry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Industry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Industry::ALL
            .into_iter()
            .find(|i| i.value() == needle || i.label().to_lowercase() == needle)
            .ok_or_else(|| anyhow::anyhow!("Unknown industry: {}", s))
    }
}
