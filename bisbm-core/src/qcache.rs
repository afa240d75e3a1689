//! A precomputed table of `log q(m, n)`, the log-count of partitions
//! of `m` into at most `n` positive parts, plus an asymptotic fallback
//! for `m` beyond the tabulated range.

const NEG_INF: f64 = f64::NEG_INFINITY;

/// Owns the `Q[m][n]` table for `0 <= m, n <= m_max`. Built once by
/// the search driver (`bisbm_core::driver`) and passed by shared
/// reference to every consumer (the entropy terms, the degree prior),
/// rather than memoized per-call or carried as mutable state on a
/// long-lived object.
#[derive(Debug, Clone)]
pub struct QCache {
    m_max: usize,
    // Flattened (m_max+1) x (m_max+1) row-major table.
    table: Vec<f64>,
}

fn logsumexp(a: f64, b: f64) -> f64 {
    if a == NEG_INF {
        return b;
    }
    if b == NEG_INF {
        return a;
    }
    let m = a.max(b);
    m + ((a - m).exp() + (b - m).exp()).ln()
}

impl QCache {
    /// Builds the table up to `requested_m_max`, capped at 10_000 even
    /// if a larger value is requested, so memory stays bounded.
    pub fn build(requested_m_max: usize) -> Self {
        let m_max = requested_m_max.min(10_000);
        let dim = m_max + 1;
        let mut table = vec![NEG_INF; dim * dim];
        let at = |t: &[f64], m: usize, n: usize| t[m * dim + n];

        for m in 0..=m_max {
            if m == 0 {
                // q(0, n) = 1 for every n >= 1: the empty partition is
                // always valid regardless of the part-count bound.
                // This is required for internal self-consistency (see
                // DESIGN.md): the m >= 1 recurrence below looks up
                // Q[0][n] whenever n == m, and a literal -inf there
                // would silently drop the "everything in one part"
                // term.
                for n in 1..=m_max {
                    table[n] = 0.0;
                }
                continue;
            }
            table[m * dim + 1] = 0.0;
            for n in 2..=m.min(m_max) {
                let a = at(&table, m, n - 1);
                let b = at(&table, m - n, n);
                table[m * dim + n] = logsumexp(a, b);
            }
            let clamp_value = at(&table, m, m.min(m_max));
            for n in (m + 1)..=m_max {
                table[m * dim + n] = clamp_value;
            }
        }

        Self { m_max, table }
    }

    pub fn m_max(&self) -> usize {
        self.m_max
    }

    /// `log_q(m, n, Q)`: logarithm of the number of partitions of
    /// integer `m` into at most `n` positive parts.
    pub fn log_q(&self, m: i64, n: i64) -> f64 {
        if m <= 0 || n < 1 {
            return 0.0;
        }
        let n = n.min(m) as u64 as usize;
        let m = m as u64 as usize;
        if m <= self.m_max {
            self.table[m * (self.m_max + 1) + n]
        } else {
            log_q_asymptotic(m as f64, n as f64)
        }
    }
}

/// Dilogarithm (Spence's function) `Li2(z) = sum_{k>=1} z^k / k^2` for
/// `z in [0, 1)`, using the reflection formula near `z = 1` to keep
/// the direct series well-conditioned.
fn dilog(z: f64) -> f64 {
    if z < 0.0 || z > 1.0 {
        return f64::NAN;
    }
    if z <= 0.5 {
        let mut sum = 0.0;
        let mut term = z;
        let mut k = 1.0;
        loop {
            sum += term / (k * k);
            term *= z;
            k += 1.0;
            if term / (k * k) < 1e-16 * sum.abs().max(1e-300) || k > 2000.0 {
                break;
            }
        }
        sum
    } else {
        let w = 1.0 - z;
        let tail = if w <= 1e-300 { 0.0 } else { dilog(w) };
        std::f64::consts::FRAC_PI_6 * std::f64::consts::PI - z.ln() * w.ln() - tail
    }
}

fn log_gamma(x: f64) -> f64 {
    statrs::function::gamma::ln_gamma(x)
}

fn log_binom(n: f64, k: f64) -> f64 {
    log_gamma(n + 1.0) - log_gamma(k + 1.0) - log_gamma(n - k + 1.0)
}

/// Asymptotic expansion of `log q(m, n)` used once `m` exceeds the
/// tabulated range.
fn log_q_asymptotic(m: f64, n: f64) -> f64 {
    let sqrt_m = m.sqrt();
    let u = n / sqrt_m;

    if n < m.powf(0.25) {
        // "small" n regime: q(m, n) ~ C(m-1, n-1).
        return log_binom(m - 1.0, n - 1.0) - log_gamma(n + 1.0);
    }

    // Fixed-point solve for v = u * sqrt(Spence(e^{-v})), tolerance 1e-8.
    let mut v = u.max(1e-6);
    for _ in 0..200 {
        let z = (-v).exp();
        let next = u * dilog(z).max(0.0).sqrt();
        if (next - v).abs() < 1e-8 {
            v = next;
            break;
        }
        v = next;
    }

    let z = (-v).exp();
    let one_minus_z = (1.0 - z).max(1e-300);
    let bracket = v.ln() - 0.5 * (one_minus_z * (1.0 + u * u / 2.0)).ln()
        + (-1.5) * 2f64.ln()
        - u.ln()
        - std::f64::consts::PI.ln();

    bracket - m.ln() + sqrt_m * (2.0 * v / u - u * one_minus_z.ln())
}
