//! Distribution tails needed by the rank tests.
//!
//! Only the survival functions the Friedman and Nemenyi procedures consume
//! are provided: chi-square (via the regularized incomplete gamma function)
//! and the studentized range with infinite degrees of freedom.

use std::f64::consts::{PI, SQRT_2};

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-15;
const TINY: f64 = 1e-300;

/// Natural logarithm of the gamma function (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula
        (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let t = x + LANCZOS_G + 0.5;
        let series = LANCZOS[1..]
            .iter()
            .enumerate()
            .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + (i + 1) as f64));
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
    }
}

/// Regularized upper incomplete gamma function `Q(a, x)`.
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if x.is_nan() || a.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        (1.0 - gamma_p_series(a, x)).max(0.0)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut delta = 1.0 / a;
    let mut sum = delta;
    for _ in 0..MAX_ITERATIONS {
        ap += 1.0;
        delta *= x / ap;
        sum += delta;
        if delta.abs() < sum.abs() * TOLERANCE {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

// Modified Lentz evaluation
fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITERATIONS {
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < TOLERANCE {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Survival function of the chi-square distribution.
pub fn chi_square_sf(x: f64, degrees_of_freedom: f64) -> f64 {
    gamma_q(degrees_of_freedom / 2.0, x / 2.0)
}

/// Complementary error function (Chebyshev fit, relative error < 1.2e-7).
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * (-z * z + poly).exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

const RANGE_LIMIT: f64 = 8.0;
const RANGE_INTERVALS: usize = 2000;

/// Survival function of the studentized range for `k` means and infinite
/// degrees of freedom.
///
/// Integrates `k · φ(z) · [Φ(z) − Φ(z − q)]^(k−1)` with composite Simpson
/// over `[−8, 8]`, outside of which the normal density is negligible.
pub fn studentized_range_sf(q: f64, k: usize) -> f64 {
    if q.is_nan() {
        return f64::NAN;
    }
    if q <= 0.0 || k < 2 {
        return 1.0;
    }

    let integrand = |z: f64| {
        let width = normal_cdf(z) - normal_cdf(z - q);
        normal_pdf(z) * width.max(0.0).powi(k as i32 - 1)
    };

    let h = 2.0 * RANGE_LIMIT / RANGE_INTERVALS as f64;
    let mut sum = integrand(-RANGE_LIMIT) + integrand(RANGE_LIMIT);
    for i in 1..RANGE_INTERVALS {
        let z = -RANGE_LIMIT + i as f64 * h;
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * integrand(z);
    }
    let cdf = k as f64 * sum * h / 3.0;

    (1.0 - cdf).clamp(0.0, 1.0)
}
