use nalgebra::Vector3;

/// Below this argument the Boys function is summed as a series, above it the
/// asymptotic form is used.
const BOYS_SERIES_LIMIT: f64 = 35.0;

/// Hermite expansion coefficient E^{ij}_t of the product of two one-dimensional
/// gaussians with exponents `a` and `b`, separated by `diff` = B - A.
pub(crate) fn hermite_expansion([i, j, t]: [i32; 3], diff: f64, a: f64, b: f64) -> f64 {
    let p = a + b;
    let q = a * b / p;

    if i < 0 || j < 0 || t < 0 || t > i + j {
        0.0
    } else if i == 0 && j == 0 {
        (-q * diff * diff).exp()
    } else if j == 0 {
        // lower i
        (2.0 * p).recip() * hermite_expansion([i - 1, j, t - 1], diff, a, b)
            + (q * diff / a) * hermite_expansion([i - 1, j, t], diff, a, b)
            + (t + 1) as f64 * hermite_expansion([i - 1, j, t + 1], diff, a, b)
    } else {
        // lower j
        (2.0 * p).recip() * hermite_expansion([i, j - 1, t - 1], diff, a, b)
            - (q * diff / b) * hermite_expansion([i, j - 1, t], diff, a, b)
            + (t + 1) as f64 * hermite_expansion([i, j - 1, t + 1], diff, a, b)
    }
}

/// Hermite coulomb integral R^n_{tuv}(p, PC), where `diff` = P - C is the vector from
/// the coulomb center to the gaussian product center.
pub(crate) fn coulomb_auxiliary(t: i32, u: i32, v: i32, n: i32, p: f64, diff: Vector3<f64>) -> f64 {
    if t < 0 || u < 0 || v < 0 {
        0.0
    } else if t == 0 && u == 0 && v == 0 {
        (-2.0 * p).powi(n) * boys(n, p * diff.norm_squared())
    } else if t == 0 && u == 0 {
        (v - 1) as f64 * coulomb_auxiliary(t, u, v - 2, n + 1, p, diff)
            + diff.z * coulomb_auxiliary(t, u, v - 1, n + 1, p, diff)
    } else if t == 0 {
        (u - 1) as f64 * coulomb_auxiliary(t, u - 2, v, n + 1, p, diff)
            + diff.y * coulomb_auxiliary(t, u - 1, v, n + 1, p, diff)
    } else {
        (t - 1) as f64 * coulomb_auxiliary(t - 2, u, v, n + 1, p, diff)
            + diff.x * coulomb_auxiliary(t - 1, u, v, n + 1, p, diff)
    }
}

/// The Boys function F_n(x) = int_0^1 t^(2n) exp(-x t^2) dt.
pub(crate) fn boys(n: i32, x: f64) -> f64 {
    if x > BOYS_SERIES_LIMIT {
        // erf(sqrt(x)) is one to machine precision here
        let decay = (-x).exp();
        let mut value = 0.5 * (std::f64::consts::PI / x).sqrt();
        for m in 0..n {
            value = ((2 * m + 1) as f64 * value - decay) / (2.0 * x);
        }
        value
    } else {
        // F_n(x) = exp(-x) sum_k (2x)^k / ((2n + 1)(2n + 3)...(2n + 2k + 1))
        let mut term = ((2 * n + 1) as f64).recip();
        let mut sum = term;
        let mut k = 1;
        while term > sum * 1e-17 {
            term *= 2.0 * x / (2 * n + 2 * k + 1) as f64;
            sum += term;
            k += 1;
        }
        (-x).exp() * sum
    }
}
