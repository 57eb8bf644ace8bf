//! Within-block ranking.

use ndarray::{ArrayView2, Axis};

/// Rank values from 1 (smallest) upward, averaging the ranks of ties.
///
/// NaN sorts after every number, so a missing measurement ranks worst.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && same_value(values[order[end]], values[order[start]]) {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Sizes of the tie groups in `values` (groups of one included).
pub fn tie_counts(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut counts = Vec::new();
    let mut start = 0;
    while start < sorted.len() {
        let mut end = start + 1;
        while end < sorted.len() && same_value(sorted[end], sorted[start]) {
            end += 1;
        }
        counts.push(end - start);
        start = end;
    }
    counts
}

/// Rank every block (row) of a blocks × treatments matrix.
pub fn block_ranks(data: ArrayView2<'_, f64>) -> Vec<Vec<f64>> {
    data.axis_iter(Axis(0)).map(|row| average_ranks(&row.to_vec())).collect()
}

/// Mean within-block rank of each treatment (column).
pub fn mean_ranks(data: ArrayView2<'_, f64>) -> Vec<f64> {
    let (blocks, treatments) = data.dim();
    let mut sums = vec![0.0; treatments];
    for ranks in block_ranks(data) {
        for (sum, rank) in sums.iter_mut().zip(ranks) {
            *sum += rank;
        }
    }
    sums.into_iter().map(|s| s / blocks.max(1) as f64).collect()
}

/// Mean within-block fractional rank (`rank / treatments`) of each treatment.
///
/// Values lie in `(0, 1]`; lower is better when the measurement is minimised.
pub fn fractional_ranks(data: ArrayView2<'_, f64>) -> Vec<f64> {
    let treatments = data.ncols().max(1) as f64;
    mean_ranks(data).into_iter().map(|r| r / treatments).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_average_ranks_without_ties() {
        assert_eq!(average_ranks(&[0.3, 0.1, 0.2]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[1.0, 2.0, 2.0, 3.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(average_ranks(&[5.0, 5.0, 5.0]), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_nan_ranks_last() {
        assert_eq!(average_ranks(&[f64::NAN, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_tie_counts() {
        let mut counts = tie_counts(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[test]
    fn test_fractional_ranks_match_percentile_rank() {
        let data = array![[1.0, 2.0, 3.0], [1.0, 3.0, 2.0]];
        let ranks = fractional_ranks(data.view());
        assert!((ranks[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((ranks[1] - 2.5 / 3.0).abs() < 1e-12);
        assert!((ranks[2] - 2.5 / 3.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_ranks_sum_to_triangular_number(
            values in proptest::collection::vec(-1e6..1e6f64, 1..30),
        ) {
            let n = values.len() as f64;
            let total: f64 = average_ranks(&values).iter().sum();
            prop_assert!((total - n * (n + 1.0) / 2.0).abs() < 1e-9);
        }

        #[test]
        fn prop_ranks_preserve_order(values in proptest::collection::vec(-1e6..1e6f64, 2..30)) {
            let ranks = average_ranks(&values);
            for i in 0..values.len() {
                for j in 0..values.len() {
                    if values[i] < values[j] {
                        prop_assert!(ranks[i] < ranks[j]);
                    }
                }
            }
        }
    }
}
