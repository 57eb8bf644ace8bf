//! Friedman rank-sum test for matched treatments across blocks.

use crate::distribution::chi_square_sf;
use crate::rank::{block_ranks, tie_counts};
use analizar_common::{AnalizarError, Result};
use ndarray::ArrayView2;

/// Outcome of a Friedman test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FriedmanResult {
    /// Tie-corrected chi-square statistic.
    pub statistic: f64,
    /// Upper-tail probability under `k - 1` degrees of freedom.
    pub p_value: f64,
    /// Number of blocks (rows).
    pub blocks: usize,
    /// Number of treatments (columns).
    pub treatments: usize,
}

impl FriedmanResult {
    /// Whether the null hypothesis is rejected at `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Run the Friedman test on a blocks × treatments matrix.
///
/// Each block is ranked independently (ties share their average rank) and
/// the rank sums are compared against the expectation under exchangeability.
pub fn friedman(data: ArrayView2<'_, f64>) -> Result<FriedmanResult> {
    let (n, k) = data.dim();
    if k < 3 {
        return Err(AnalizarError::InsufficientData {
            test: "Friedman test".into(),
            message: format!("need at least 3 treatments, got {k}"),
        });
    }
    if n == 0 {
        return Err(AnalizarError::InsufficientData {
            test: "Friedman test".into(),
            message: "no blocks to compare".into(),
        });
    }

    let ranks = block_ranks(data);

    let ties: f64 = data
        .rows()
        .into_iter()
        .flat_map(|row| tie_counts(&row.to_vec()))
        .map(|t| {
            let t = t as f64;
            t * (t * t - 1.0)
        })
        .sum();

    let (nf, kf) = (n as f64, k as f64);
    let correction = 1.0 - ties / (kf * (kf * kf - 1.0) * nf);

    if correction <= 0.0 {
        // Every block is fully tied: no evidence of any difference.
        return Ok(FriedmanResult { statistic: 0.0, p_value: 1.0, blocks: n, treatments: k });
    }

    let rank_sums_squared: f64 = (0..k)
        .map(|j| ranks.iter().map(|block| block[j]).sum::<f64>().powi(2))
        .sum();

    let statistic =
        (12.0 / (kf * nf * (kf + 1.0)) * rank_sums_squared - 3.0 * nf * (kf + 1.0)) / correction;
    let p_value = chi_square_sf(statistic, kf - 1.0);

    Ok(FriedmanResult { statistic, p_value, blocks: n, treatments: k })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_consistent_ordering_is_significant() {
        // 24 blocks, treatment 0 always best, 1 and 2 alternate
        let data = Array2::from_shape_fn((24, 3), |(i, j)| match j {
            0 => 1e-6,
            1 if i % 2 == 0 => 1.0,
            1 => 2.0,
            _ if i % 2 == 0 => 2.0,
            _ => 1.0,
        });
        let result = friedman(data.view()).unwrap();
        // Rank sums 24, 60, 60 → 12/288 · 7776 − 288 = 36
        assert_abs_diff_eq!(result.statistic, 36.0, epsilon = 1e-9);
        assert!(result.is_significant(0.05));
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn test_matches_reference_value() {
        // scipy.stats.friedmanchisquare([1,2,3,4],[2,3,4,1],[3,4,1,2]) on blocks as rows
        let data = array![[1.0, 2.0, 3.0], [2.0, 3.0, 4.0], [3.0, 4.0, 1.0], [4.0, 1.0, 2.0]];
        let result = friedman(data.view()).unwrap();
        assert_abs_diff_eq!(result.statistic, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(result.p_value, (-0.25_f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_ties_are_corrected() {
        let data = array![[1.0, 1.0, 2.0], [1.0, 2.0, 3.0], [1.0, 2.0, 3.0]];
        let result = friedman(data.view()).unwrap();
        // Rank sums 3.5, 5.5, 9; raw 12/36·(12.25+30.25+81) − 36 = 5.1667, c = 1 − 6/72
        let expected = (123.5 / 3.0 - 36.0) / (1.0 - 6.0 / 72.0);
        assert_abs_diff_eq!(result.statistic, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_fully_tied_blocks() {
        let data = Array2::from_elem((5, 4), 1.0);
        let result = friedman(data.view()).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.is_significant(0.05));
    }

    #[test]
    fn test_requires_three_treatments() {
        let data = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(matches!(friedman(data.view()), Err(AnalizarError::InsufficientData { .. })));
    }

    #[test]
    fn test_requires_blocks() {
        let data = Array2::<f64>::zeros((0, 3));
        assert!(friedman(data.view()).is_err());
    }
}
