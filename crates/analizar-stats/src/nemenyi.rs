//! Nemenyi post-hoc test following a Friedman test.

use crate::distribution::studentized_range_sf;
use crate::rank::mean_ranks;
use analizar_common::{AnalizarError, Result};
use ndarray::{Array2, ArrayView2};

/// Pairwise Nemenyi p-values for a blocks × treatments matrix.
///
/// Returns a symmetric treatments × treatments matrix with ones on the
/// diagonal. Each off-diagonal entry is the probability of a studentized
/// range at least as large as the scaled mean-rank difference of the pair.
pub fn nemenyi(data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let (n, k) = data.dim();
    if k < 2 || n == 0 {
        return Err(AnalizarError::InsufficientData {
            test: "Nemenyi test".into(),
            message: format!("need at least 2 treatments and 1 block, got {k} and {n}"),
        });
    }

    let ranks = mean_ranks(data);
    let (nf, kf) = (n as f64, k as f64);
    let scale = (kf * (kf + 1.0) / (6.0 * nf)).sqrt();

    let mut p_values = Array2::from_elem((k, k), 1.0);
    for i in 0..k {
        for j in (i + 1)..k {
            let q = (ranks[i] - ranks[j]).abs() / scale * std::f64::consts::SQRT_2;
            let p = studentized_range_sf(q, k);
            p_values[[i, j]] = p;
            p_values[[j, i]] = p;
        }
    }
    Ok(p_values)
}
