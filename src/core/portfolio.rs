//! Weighted portfolio construction over a small set of securities.
//!
//! A [`Portfolio`] is an immutable snapshot: every edit returns a new value
//! and leaves the receiver untouched, so the caller owns all state.
use crate::core::security::Security;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_TOTAL_INVESTMENT: f64 = 10_000.0;

/// Risk-free rate in percent used by the Sharpe ratio.
pub const RISK_FREE_RATE: f64 = 2.0;

/// Allowed distance of the weight total from 100 before it is flagged.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Penalty used for the P/E component when the ratio is unknown.
const UNKNOWN_PE_PENALTY: f64 = 5.0;

/// Heuristic risk score of a single security.
///
/// Average of three components: volatility (`|priceGrowth| / 10`), an
/// inverted size score (`10 - log10(marketCap) / 3`) and a valuation score
/// (`min(pe / 20, 5)`, or 5 when the P/E is unknown). Typical values fall
/// between 0 and 10 but the result is not clamped.
pub fn risk_score(security: &Security) -> f64 {
    let volatility_score = security.price_growth.abs() / 10.0;
    let market_cap_score = 10.0 - security.market_cap.log10() / 3.0;
    let pe_score = security
        .known_pe_ratio()
        .map_or(UNKNOWN_PE_PENALTY, |pe| (pe / 20.0).min(5.0));
    (volatility_score + market_cap_score + pe_score) / 3.0
}

/// A security held in the portfolio together with its allocation.
///
/// `investment_amount` and `shares` are always derived from `weight` and the
/// portfolio's total investment; there is no way to set them directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub security: Security,
    pub weight: f64,
    pub investment_amount: f64,
    pub shares: f64,
    /// Raw quarter-over-quarter growth of the security.
    pub expected_return: f64,
    pub risk_score: f64,
}

impl Position {
    fn new(security: Security, weight: f64, total_investment: f64) -> Self {
        let expected_return = security.quarter_over_quarter_growth;
        let risk_score = risk_score(&security);
        let mut position = Position {
            security,
            weight: 0.0,
            investment_amount: 0.0,
            shares: 0.0,
            expected_return,
            risk_score,
        };
        position.allocate(weight, total_investment);
        position
    }

    fn allocate(&mut self, weight: f64, total_investment: f64) {
        self.weight = weight;
        self.investment_amount = total_investment * weight / 100.0;
        self.shares = if self.security.current_price > 0.0 {
            self.investment_amount / self.security.current_price
        } else {
            0.0
        };
    }

    pub fn symbol(&self) -> &str {
        &self.security.symbol
    }
}

impl AsRef<Security> for Position {
    fn as_ref(&self) -> &Security {
        &self.security
    }
}

/// Named allocation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strategy {
    /// Weight proportional to quarter-over-quarter growth.
    Aggressive,
    /// Weight proportional to market capitalisation.
    Conservative,
    /// Weight proportional to the inverse of the risk score.
    Balanced,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Aggressive,
        Strategy::Conservative,
        Strategy::Balanced,
    ];

    /// Computes the weights this strategy assigns to `positions`.
    ///
    /// Returns `None` when the strategy is undefined for the input: a zero or
    /// non-finite denominator, or a zero risk score under `Balanced`.
    pub fn weights(&self, positions: &[Position]) -> Option<Vec<f64>> {
        if positions.is_empty() {
            return None;
        }

        let scores: Vec<f64> = match self {
            Strategy::Aggressive => positions.iter().map(|p| p.expected_return).collect(),
            Strategy::Conservative => positions.iter().map(|p| p.security.market_cap).collect(),
            Strategy::Balanced => {
                if positions
                    .iter()
                    .any(|p| p.risk_score == 0.0 || !p.risk_score.is_finite())
                {
                    return None;
                }
                positions.iter().map(|p| 1.0 / p.risk_score).collect()
            }
        };

        // Scores that cancel out leave only rounding noise in the total.
        let total: f64 = scores.iter().sum();
        let magnitude: f64 = scores.iter().map(|s| s.abs()).sum();
        if !total.is_finite() || total.abs() <= f64::EPSILON * magnitude * scores.len() as f64 {
            return None;
        }

        let weights: Vec<f64> = scores.iter().map(|s| s / total * 100.0).collect();
        weights.iter().all(|w| w.is_finite()).then_some(weights)
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Strategy::Aggressive => "aggressive",
                Strategy::Conservative => "conservative",
                Strategy::Balanced => "balanced",
            }
        )
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aggressive" => Ok(Strategy::Aggressive),
            "conservative" => Ok(Strategy::Conservative),
            "balanced" => Ok(Strategy::Balanced),
            _ => Err(anyhow::anyhow!("Invalid strategy: {}", s)),
        }
    }
}

/// Sum of the weights and whether it is close enough to 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightCheck {
    pub total: f64,
    pub is_valid: bool,
}

/// Portfolio level aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioStats {
    pub expected_return: f64,
    pub risk_score: f64,
    /// `None` when the aggregate risk score is zero.
    pub sharpe_ratio: Option<f64>,
}

/// Computes weighted expected return, weighted risk score and the Sharpe ratio.
///
/// An empty slice yields zero return, zero risk and no Sharpe ratio.
pub fn portfolio_stats(positions: &[Position]) -> PortfolioStats {
    let expected_return: f64 = positions
        .iter()
        .map(|p| p.expected_return * (p.weight / 100.0))
        .sum();
    let risk_score: f64 = positions
        .iter()
        .map(|p| p.risk_score * (p.weight / 100.0))
        .sum();

    let sharpe_ratio = if risk_score == 0.0 {
        None
    } else {
        Some((expected_return - RISK_FREE_RATE) / risk_score).filter(|s| s.is_finite())
    };
    if sharpe_ratio.is_none() {
        debug!(expected_return, risk_score, "Sharpe ratio undefined");
    }

    PortfolioStats {
        expected_return,
        risk_score,
        sharpe_ratio,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    positions: Vec<Position>,
    total_investment: f64,
}

impl Default for Portfolio {
    fn default() -> Self {
        Portfolio {
            positions: Vec::new(),
            total_investment: DEFAULT_TOTAL_INVESTMENT,
        }
    }
}

impl Portfolio {
    /// Creates a portfolio holding every security at an equal weight.
    ///
    /// No securities produce an empty portfolio.
    pub fn initialize(securities: &[Security], total_investment: f64) -> Self {
        let total_investment = clamp_investment(total_investment);
        if securities.is_empty() {
            debug!("Initializing empty portfolio");
            return Portfolio {
                positions: Vec::new(),
                total_investment,
            };
        }

        let weight = 100.0 / securities.len() as f64;
        let positions = securities
            .iter()
            .cloned()
            .map(|s| Position::new(s, weight, total_investment))
            .collect();
        Portfolio {
            positions,
            total_investment,
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn total_investment(&self) -> f64 {
        self.total_investment
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol() == symbol)
    }

    /// Weights in position order, ready for the risk analyzer.
    pub fn weights(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.weight).collect()
    }

    /// Sets a single position's weight, clamped to `[0, 100]`.
    ///
    /// Other positions keep their weights, so the total may drift away from
    /// 100; see [`Portfolio::weight_check`]. An unknown symbol is ignored.
    pub fn set_weight(&self, symbol: &str, weight: f64) -> Self {
        let weight = if weight.is_nan() {
            0.0
        } else {
            weight.clamp(0.0, 100.0)
        };

        let mut next = self.clone();
        match next.positions.iter_mut().find(|p| p.symbol() == symbol) {
            Some(position) => position.allocate(weight, next.total_investment),
            None => debug!("Ignoring weight for unknown symbol {}", symbol),
        }
        next
    }

    /// Changes the amount to invest and re-derives every amount and share count.
    pub fn set_total_investment(&self, amount: f64) -> Self {
        let total_investment = clamp_investment(amount);
        let mut next = self.clone();
        next.total_investment = total_investment;
        for position in &mut next.positions {
            position.allocate(position.weight, total_investment);
        }
        next
    }

    /// Resets every position to `100 / N`.
    pub fn rebalance_equal(&self) -> Self {
        if self.positions.is_empty() {
            return self.clone();
        }
        let weight = 100.0 / self.positions.len() as f64;
        self.with_weights(&vec![weight; self.positions.len()])
    }

    /// Re-weights all positions with `strategy`.
    ///
    /// When the strategy is undefined for the current holdings the portfolio
    /// falls back to equal weights.
    pub fn apply_strategy(&self, strategy: Strategy) -> Self {
        match strategy.weights(&self.positions) {
            Some(weights) => {
                debug!(%strategy, ?weights, "Applying strategy");
                self.with_weights(&weights)
            }
            None => {
                if !self.positions.is_empty() {
                    warn!(%strategy, "Strategy undefined for current holdings, using equal weights");
                }
                self.rebalance_equal()
            }
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    /// Reports whether the weights add up to 100 within [`WEIGHT_TOLERANCE`].
    pub fn weight_check(&self) -> WeightCheck {
        let total = self.total_weight();
        WeightCheck {
            total,
            is_valid: (total - 100.0).abs() < WEIGHT_TOLERANCE,
        }
    }

    pub fn stats(&self) -> PortfolioStats {
        portfolio_stats(&self.positions)
    }

    fn with_weights(&self, weights: &[f64]) -> Self {
        let mut next = self.clone();
        for (position, weight) in next.positions.iter_mut().zip(weights) {
            position.allocate(*weight, next.total_investment);
        }
        next
    }
}

fn clamp_investment(amount: f64) -> f64 {
    if amount.is_nan() || amount == f64::NEG_INFINITY {
        return 0.0;
    }
    if amount == f64::INFINITY {
        warn!("Total investment is infinite, using the largest finite amount");
        return f64::MAX;
    }
    amount.max(0.0)
}
