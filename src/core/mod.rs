//! Core domain: securities, portfolio construction and risk analysis

pub mod cache;
pub mod config;
pub mod log;
pub mod portfolio;
pub mod risk;
pub mod screener;
pub mod security;
pub mod source;

// Re-export main types for cleaner imports
pub use portfolio::{Portfolio, PortfolioStats, Position, Strategy, WeightCheck};
pub use risk::{CorrelationMatrix, RiskAnalyzer, RiskReport};
pub use screener::{PriceFilter, Selection, SortDirection, SortKey, SortState};
pub use security::{Industry, Security};
pub use source::StockProvider;
