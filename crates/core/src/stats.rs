//! Normal-distribution helpers and the two-proportion z-test.

use std::f64::consts::{PI, SQRT_2};

const SERIES_CUTOFF: f64 = 2.5;
const CONTINUED_FRACTION_TERMS: usize = 80;

/// Error function, accurate to a few ulps across the real line.
///
/// Uses the Maclaurin series below |x| = 2.5 and the Laplace continued
/// fraction for erfc above it.
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let ax = x.abs();
    let value = if ax < SERIES_CUTOFF {
        erf_series(ax)
    } else {
        1.0 - erfc_continued_fraction(ax)
    };
    value.copysign(x)
}

/// Complementary error function, 1 - erf(x).
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x >= SERIES_CUTOFF {
        erfc_continued_fraction(x)
    } else if x <= -SERIES_CUTOFF {
        2.0 - erfc_continued_fraction(-x)
    } else {
        1.0 - erf(x)
    }
}

fn erf_series(x: f64) -> f64 {
    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    for n in 1..200 {
        term *= -x2 / n as f64;
        let contribution = term / (2 * n + 1) as f64;
        sum += contribution;
        if contribution.abs() < 1e-17 * sum.abs() {
            break;
        }
    }
    2.0 / PI.sqrt() * sum
}

fn erfc_continued_fraction(x: f64) -> f64 {
    if x.is_infinite() {
        return 0.0;
    }
    let mut f = x;
    for k in (1..=CONTINUED_FRACTION_TERMS).rev() {
        f = x + (k as f64 / 2.0) / f;
    }
    (-x * x).exp() / (PI.sqrt() * f)
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    // erfc keeps precision in the lower tail.
    0.5 * erfc(-x / SQRT_2)
}

/// Two-sided confidence for a z statistic: 1 - 2 * (1 - Φ(|z|)).
pub fn two_sided_confidence(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { 0.0 } else { 1.0 };
    }
    let upper_tail = 0.5 * erfc(z.abs() / SQRT_2);
    (1.0 - 2.0 * upper_tail).clamp(0.0, 1.0)
}

/// Pooled two-proportion z statistic of `b` against `a`.
///
/// Returns `None` when either sample is empty or the pooled variance is zero.
pub fn two_proportion_z(
    conversions_a: u64,
    samples_a: u64,
    conversions_b: u64,
    samples_b: u64,
) -> Option<f64> {
    if samples_a == 0 || samples_b == 0 {
        return None;
    }
    let n1 = samples_a as f64;
    let n2 = samples_b as f64;
    let p1 = conversions_a as f64 / n1;
    let p2 = conversions_b as f64 / n2;
    let pooled = (conversions_a as f64 + conversions_b as f64) / (n1 + n2);
    let variance = pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2);
    if variance.is_nan() || variance <= 0.0 {
        return None;
    }
    Some((p2 - p1) / variance.sqrt())
}
