//! Correlation, beta and diversification heuristics for a set of holdings.
//!
//! Correlations are computed from only three monthly growth samples per
//! security and beta assumes a flat 10% market return. These are deliberate
//! simplifications for a comparison dashboard, not textbook estimators.
use crate::core::security::Security;
use serde::Serialize;
use tracing::debug;

/// Market return in percent that beta is measured against.
const MARKET_RETURN: f64 = 10.0;

/// Square, symmetric matrix of pairwise correlations with a unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Looks up the correlation between two symbols.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.get(i, j)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }
}

/// Pearson correlation of two equally sized samples using `n - 1` denominators.
///
/// Returns `None` when the samples differ in length, hold fewer than two
/// points, or either one has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }

    let denom = (n - 1) as f64;
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let covariance = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum::<f64>()
        / denom;
    let std_x = (x.iter().map(|xi| (xi - mean_x).powi(2)).sum::<f64>() / denom).sqrt();
    let std_y = (y.iter().map(|yi| (yi - mean_y).powi(2)).sum::<f64>() / denom).sqrt();

    if std_x == 0.0 || std_y == 0.0 {
        return None;
    }
    Some(covariance / (std_x * std_y))
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(-1.0, 1.0))
}

/// Builds the correlation matrix from each security's monthly growth samples.
///
/// A pair involving a security whose three samples are identical has no
/// defined correlation and is reported as `0.0`.
pub fn correlation_matrix<S: AsRef<Security>>(securities: &[S]) -> CorrelationMatrix {
    let n = securities.len();
    let samples: Vec<[f64; 3]> = securities
        .iter()
        .map(|s| s.as_ref().monthly_growths())
        .collect();

    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let correlation = pearson(&samples[i], &samples[j]).unwrap_or_else(|| {
                debug!(
                    "Correlation undefined between {} and {}, using 0",
                    securities[i].as_ref().symbol,
                    securities[j].as_ref().symbol
                );
                0.0
            });
            values[i][j] = correlation;
            values[j][i] = correlation;
        }
    }

    CorrelationMatrix {
        symbols: securities
            .iter()
            .map(|s| s.as_ref().symbol.clone())
            .collect(),
        values,
    }
}

/// Simplified beta: price growth relative to a 10% market return.
pub fn beta(security: &Security) -> f64 {
    security.price_growth / MARKET_RETURN
}

/// Weighted sum of betas. Missing weights count as zero.
pub fn portfolio_beta<S: AsRef<Security>>(securities: &[S], weights: &[f64]) -> f64 {
    securities
        .iter()
        .zip(weights)
        .map(|(s, w)| beta(s.as_ref()) * (w / 100.0))
        .sum()
}

/// Scores how uncorrelated the weighted holdings are, from 0 (fully
/// correlated) to roughly 10 (fully uncorrelated).
///
/// Sums `(1 - |corr[i][j]|) * w_i * w_j` over every ordered pair `i != j`
/// with weights as fractions, scaled by 10. A single holding scores 0.
pub fn diversification_score(matrix: &CorrelationMatrix, weights: &[f64]) -> f64 {
    let n = weights.len().min(matrix.len());
    let mut score = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let correlation = matrix.get(i, j).unwrap_or(0.0);
            score += (1.0 - correlation.abs()) * (weights[i] / 100.0) * (weights[j] / 100.0);
        }
    }
    score * 10.0
}

/// Everything the risk view shows for one set of holdings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub correlation: CorrelationMatrix,
    pub betas: Vec<(String, f64)>,
    pub portfolio_beta: f64,
    pub diversification_score: f64,
}

pub struct RiskAnalyzer;

impl RiskAnalyzer {
    /// Runs the full analysis. `weights` are percentages in the same order
    /// as `securities`; missing trailing weights count as zero.
    pub fn analyze<S: AsRef<Security>>(securities: &[S], weights: &[f64]) -> RiskReport {
        let mut weights = weights.to_vec();
        weights.resize(securities.len(), 0.0);

        let correlation = correlation_matrix(securities);
        let betas = securities
            .iter()
            .map(|s| (s.as_ref().symbol.clone(), beta(s.as_ref())))
            .collect();
        let portfolio_beta = portfolio_beta(securities, &weights);
        let diversification_score = diversification_score(&correlation, &weights);
        debug!(portfolio_beta, diversification_score, "Risk analysis complete");

        RiskReport {
            correlation,
            betas,
            portfolio_beta,
            diversification_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::portfolio::Portfolio;
    use crate::core::security::fixtures::{pair, security};

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_anti_correlated_pair() {
        let matrix = correlation_matrix(&pair());

        assert_eq!(matrix.between("A", "B"), Some(-1.0));
        assert_eq!(matrix.between("B", "A"), Some(-1.0));
        assert_eq!(matrix.get(0, 0), Some(1.0));
        assert_eq!(matrix.get(1, 1), Some(1.0));
        assert_eq!(matrix.symbols(), ["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let securities = vec![
            security("A", [1.0, 4.0, 2.0], 1e9, None),
            security("B", [-2.0, 0.5, 3.0], 1e9, None),
            security("C", [7.0, 1.0, 1.5], 1e9, None),
            security("D", [0.1, 0.2, 0.4], 1e9, None),
        ];
        let matrix = correlation_matrix(&securities);

        for i in 0..matrix.len() {
            assert_eq!(matrix.get(i, i), Some(1.0));
            for j in 0..matrix.len() {
                let value = matrix.get(i, j).unwrap();
                assert_eq!(Some(value), matrix.get(j, i));
                assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&value));
            }
        }
    }

    #[test]
    fn test_zero_variance_falls_back_to_zero() {
        let securities = vec![
            security("FLAT", [2.0, 2.0, 2.0], 1e9, None),
            security("B", [1.0, 2.0, 3.0], 1e9, None),
        ];
        let matrix = correlation_matrix(&securities);
        assert_eq!(matrix.between("FLAT", "B"), Some(0.0));
        assert_eq!(matrix.get(0, 0), Some(1.0));
        assert_eq!(pearson(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_pearson_rejects_short_or_mismatched_samples() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_close(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn test_empty_and_single_security() {
        let empty: Vec<Security> = Vec::new();
        let matrix = correlation_matrix(&empty);
        assert!(matrix.is_empty());
        assert_eq!(diversification_score(&matrix, &[]), 0.0);
        assert_eq!(portfolio_beta(&empty, &[]), 0.0);

        let single = vec![security("A", [1.0, 2.0, 3.0], 1e9, None)];
        let matrix = correlation_matrix(&single);
        assert_eq!(matrix.get(0, 0), Some(1.0));
        assert_eq!(diversification_score(&matrix, &[100.0]), 0.0);
    }

    #[test]
    fn test_beta_and_portfolio_beta() {
        let mut a = security("A", [1.0, 2.0, 3.0], 1e9, None);
        a.price_growth = 15.0;
        let mut b = security("B", [3.0, 2.0, 1.0], 1e9, None);
        b.price_growth = -5.0;

        assert_eq!(beta(&a), 1.5);
        assert_eq!(beta(&b), -0.5);
        assert_close(portfolio_beta(&[a.clone(), b.clone()], &[60.0, 40.0]), 0.7, 1e-12);
        // missing weights count as zero
        assert_close(portfolio_beta(&[a, b], &[100.0]), 1.5, 1e-12);
    }

    #[test]
    fn test_diversification_score() {
        // perfectly anti-correlated: |corr| = 1 so no diversification credit
        let matrix = correlation_matrix(&pair());
        assert_eq!(diversification_score(&matrix, &[50.0, 50.0]), 0.0);

        // uncorrelated pair at 50/50: 2 * 0.25 * 10
        let securities = vec![
            security("A", [1.0, 2.0, 3.0], 1e9, None),
            security("B", [1.0, 3.0, 1.0], 1e9, None),
        ];
        let matrix = correlation_matrix(&securities);
        assert_close(matrix.between("A", "B").unwrap(), 0.0, 1e-12);
        assert_close(diversification_score(&matrix, &[50.0, 50.0]), 5.0, 1e-9);
    }

    #[test]
    fn test_collinear_samples_stay_within_unit_range() {
        assert_eq!(pearson(&[-0.6, -0.6, -0.1], &[-0.22, -0.22, 0.13]), Some(1.0));

        let securities = vec![
            security("A", [-0.6, -0.6, -0.1], 1e9, None),
            security("B", [-0.22, -0.22, 0.13], 1e9, None),
        ];
        let matrix = correlation_matrix(&securities);
        assert_eq!(matrix.between("A", "B"), Some(1.0));
        assert_eq!(diversification_score(&matrix, &[50.0, 50.0]), 0.0);
    }

    #[test]
    fn test_diversification_score_non_negative() {
        let securities = vec![
            security("A", [1.0, 4.0, 2.0], 1e9, None),
            security("B", [-2.0, 0.5, 3.0], 1e9, None),
            security("C", [7.0, 1.0, 1.5], 1e9, None),
        ];
        let matrix = correlation_matrix(&securities);
        for weights in [[100.0, 0.0, 0.0], [20.0, 30.0, 50.0], [33.3, 33.3, 33.4]] {
            assert!(diversification_score(&matrix, &weights) >= 0.0);
        }
    }

    #[test]
    fn test_analyze_portfolio_positions() {
        let portfolio = Portfolio::initialize(&pair(), 10_000.0);
        let report = RiskAnalyzer::analyze(portfolio.positions(), &portfolio.weights());

        assert_eq!(report.correlation.between("A", "B"), Some(-1.0));
        assert_eq!(report.betas, vec![("A".to_string(), 0.0), ("B".to_string(), 0.0)]);
        assert_eq!(report.portfolio_beta, 0.0);
        assert_eq!(report.diversification_score, 0.0);
    }
}
