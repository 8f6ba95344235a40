//! Filtering, sorting and selecting securities before they reach the
//! portfolio engine.
use crate::core::security::Security;
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Maximum number of securities that can be compared at once.
pub const MAX_SELECTION: usize = 5;

/// Inclusive price bounds. A missing bound does not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceFilter {
    pub fn matches(&self, security: &Security) -> bool {
        if self.min.is_some_and(|min| security.current_price < min) {
            return false;
        }
        if self.max.is_some_and(|max| security.current_price > max) {
            return false;
        }
        true
    }

    pub fn apply(&self, securities: &[Security]) -> Vec<Security> {
        securities
            .iter()
            .filter(|s| self.matches(s))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Symbol,
    CompanyName,
    CurrentPrice,
    PriceGrowth,
    MarketCap,
    QuarterOverQuarterGrowth,
}

impl SortKey {
    fn compare(&self, a: &Security, b: &Security) -> Ordering {
        match self {
            SortKey::Symbol => a.symbol.cmp(&b.symbol),
            SortKey::CompanyName => a.company_name.cmp(&b.company_name),
            SortKey::CurrentPrice => a.current_price.total_cmp(&b.current_price),
            SortKey::PriceGrowth => a.price_growth.total_cmp(&b.price_growth),
            SortKey::MarketCap => a.market_cap.total_cmp(&b.market_cap),
            SortKey::QuarterOverQuarterGrowth => a
                .quarter_over_quarter_growth
                .total_cmp(&b.quarter_over_quarter_growth),
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortKey::Symbol => "symbol",
                SortKey::CompanyName => "name",
                SortKey::CurrentPrice => "price",
                SortKey::PriceGrowth => "growth",
                SortKey::MarketCap => "market-cap",
                SortKey::QuarterOverQuarterGrowth => "qoq",
            }
        )
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "symbol" => Ok(SortKey::Symbol),
            "name" | "company" => Ok(SortKey::CompanyName),
            "price" => Ok(SortKey::CurrentPrice),
            "growth" => Ok(SortKey::PriceGrowth),
            "market-cap" | "marketcap" | "cap" => Ok(SortKey::MarketCap),
            "qoq" => Ok(SortKey::QuarterOverQuarterGrowth),
            _ => Err(anyhow::anyhow!("Invalid sort key: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Column sort state. Requesting the same key cycles
/// ascending, descending, then unsorted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<(SortKey, SortDirection)>,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        SortState {
            active: Some((key, direction)),
        }
    }

    pub fn active(&self) -> Option<(SortKey, SortDirection)> {
        self.active
    }

    pub fn direction_for(&self, key: SortKey) -> Option<SortDirection> {
        self.active.filter(|(k, _)| *k == key).map(|(_, d)| d)
    }

    pub fn request(&self, key: SortKey) -> Self {
        let active = match self.active {
            Some((k, SortDirection::Ascending)) if k == key => Some((key, SortDirection::Descending)),
            Some((k, SortDirection::Descending)) if k == key => None,
            _ => Some((key, SortDirection::Ascending)),
        };
        SortState { active }
    }

    /// Returns a sorted copy; the input order is kept when unsorted and for
    /// equal elements.
    pub fn sorted(&self, securities: &[Security]) -> Vec<Security> {
        let mut sorted = securities.to_vec();
        if let Some((key, direction)) = self.active {
            sorted.sort_by(|a, b| match direction {
                SortDirection::Ascending => key.compare(a, b),
                SortDirection::Descending => key.compare(b, a),
            });
        }
        sorted
    }
}

/// Security with the highest price growth. Ties go to the later one.
pub fn best_performer(securities: &[Security]) -> Option<&Security> {
    securities
        .iter()
        .reduce(|prev, cur| if prev.price_growth > cur.price_growth { prev } else { cur })
}

/// Security with the lowest price growth. Ties go to the later one.
pub fn worst_performer(securities: &[Security]) -> Option<&Security> {
    securities
        .iter()
        .reduce(|prev, cur| if prev.price_growth < cur.price_growth { prev } else { cur })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    Removed,
    /// The selection is already at [`MAX_SELECTION`].
    Full,
}

/// Ordered set of up to [`MAX_SELECTION`] securities, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    securities: Vec<Security>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn securities(&self) -> &[Security] {
        &self.securities
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.securities.iter().any(|s| s.symbol == symbol)
    }

    /// Removes the security when selected, otherwise appends it if there is room.
    pub fn toggle(&mut self, security: &Security) -> SelectionChange {
        if self.contains(&security.symbol) {
            self.securities.retain(|s| s.symbol != security.symbol);
            return SelectionChange::Removed;
        }
        if self.securities.len() >= MAX_SELECTION {
            debug!("Selection full, ignoring {}", security.symbol);
            return SelectionChange::Full;
        }
        self.securities.push(security.clone());
        SelectionChange::Added
    }
}

pub const PRICE_POINT_LABELS: [&str; 6] = [
    "Start Quarter",
    "Month 1",
    "Month 2",
    "Month 3",
    "End Quarter",
    "Current",
];

/// Six price points per security plus a padded price range for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    pub series: Vec<(String, [f64; 6])>,
    pub min: f64,
    pub max: f64,
}

/// Lays out each security's quarter prices in [`PRICE_POINT_LABELS`] order.
///
/// The range is padded by 5% of the spread on both sides. Returns `None`
/// for an empty input.
pub fn price_history(securities: &[Security]) -> Option<PriceHistory> {
    if securities.is_empty() {
        return None;
    }

    let series: Vec<(String, [f64; 6])> = securities
        .iter()
        .map(|s| {
            (
                s.symbol.clone(),
                [
                    s.start_quarter_price,
                    s.month1_price,
                    s.month2_price,
                    s.month3_price,
                    s.end_quarter_price,
                    s.current_price,
                ],
            )
        })
        .collect();

    let all = series.iter().flat_map(|(_, prices)| prices.iter().copied());
    let (min, max) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p), hi.max(p))
    });
    let padding = (max - min) * 0.05;

    Some(PriceHistory {
        series,
        min: min - padding,
        max: max + padding,
    })
}
