use std::sync::OnceLock;

/// Resolution of the lookup table: one entry per 0.001 nats of difference.
pub const LOG_SUM_SCALE: f32 = 1000.0;
/// The table covers differences in `[0, 16)` nats; beyond that the smaller
/// operand contributes less than f32 epsilon.
pub const LOG_SUM_TABLE_SIZE: usize = 16_000;

const MAX_TABLED_DIFFERENCE: f32 = (LOG_SUM_TABLE_SIZE as f32 - 1.0) / LOG_SUM_SCALE;

static LOG_SUM_TABLE: OnceLock<Vec<f32>> = OnceLock::new();

fn log_sum_table() -> &'static [f32] {
    LOG_SUM_TABLE.get_or_init(|| {
        // one extra entry so interpolation can read table[i + 1] at the top end
        (0..=LOG_SUM_TABLE_SIZE)
            .map(|i| (1.0 + (-(i as f64) / LOG_SUM_SCALE as f64).exp()).ln() as f32)
            .collect()
    })
}

/// Compute `ln(e^x + e^y)` for natural-log-space operands.
///
/// If either operand is negative infinity (log-space zero), the other
/// operand is returned unchanged. Accuracy is within 1e-4 of the exact
/// value across the full range of finite inputs.
#[inline]
pub fn log_sum(x: f32, y: f32) -> f32 {
    let (max, min) = if x > y { (x, y) } else { (y, x) };

    if min == f32::NEG_INFINITY || max - min >= MAX_TABLED_DIFFERENCE {
        return max;
    }

    let table = log_sum_table();
    let scaled = (max - min) * LOG_SUM_SCALE;
    let idx = scaled as usize;
    let frac = scaled - idx as f32;
    max + table[idx] + frac * (table[idx + 1] - table[idx])
}

/// Compute `ln(e^x * e^y)` for natural-log-space operands.
#[inline]
pub fn log_prod(x: f32, y: f32) -> f32 {
    x + y
}

/// The arithmetic capability threaded through the bounded recurrences.
///
/// The same recurrence code runs over natural-log-space probabilities
/// (the production configuration) or over plain probabilities (used to
/// cross-check the log-space kernel). Profile parameters are always stored
/// in log space, so `from_log` converts them into the working space.
pub trait Semiring: Copy {
    const ZERO: f32;
    const ONE: f32;

    fn sum(x: f32, y: f32) -> f32;
    fn prod(x: f32, y: f32) -> f32;
    fn from_log(log_value: f32) -> f32;
}

/// Natural-log-space probability arithmetic backed by the lookup table.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSpace;

impl Semiring for LogSpace {
    const ZERO: f32 = f32::NEG_INFINITY;
    const ONE: f32 = 0.0;

    #[inline]
    fn sum(x: f32, y: f32) -> f32 {
        log_sum(x, y)
    }

    #[inline]
    fn prod(x: f32, y: f32) -> f32 {
        x + y
    }

    #[inline]
    fn from_log(log_value: f32) -> f32 {
        log_value
    }
}

/// Plain probability arithmetic. Underflows on long sequences; retained for
/// verification of the log-space kernel on small inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalSpace;

impl Semiring for NormalSpace {
    const ZERO: f32 = 0.0;
    const ONE: f32 = 1.0;

    #[inline]
    fn sum(x: f32, y: f32) -> f32 {
        x + y
    }

    #[inline]
    fn prod(x: f32, y: f32) -> f32 {
        x * y
    }

    #[inline]
    fn from_log(log_value: f32) -> f32 {
        log_value.exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_sum_exact(x: f64, y: f64) -> f64 {
        (x.exp() + y.exp()).ln()
    }

    #[test]
    fn log_sum_matches_exact_within_tolerance() {
        let values: Vec<f32> = (-60..=0).map(|i| i as f32 * 0.37).collect();
        for &x in &values {
            for &y in &values {
                let approx = log_sum(x, y);
                let exact = log_sum_exact(x as f64, y as f64) as f32;
                assert!(
                    (approx - exact).abs() < 1e-4,
                    "log_sum({x}, {y}) = {approx}, exact = {exact}"
                );
            }
        }
    }

    #[test]
    fn log_sum_identities() {
        assert_eq!(log_sum(f32::NEG_INFINITY, -3.25), -3.25);
        assert_eq!(log_sum(-3.25, f32::NEG_INFINITY), -3.25);
        assert_eq!(
            log_sum(f32::NEG_INFINITY, f32::NEG_INFINITY),
            f32::NEG_INFINITY
        );
        // far apart: the smaller operand is absorbed
        assert_eq!(log_sum(0.0, -20.0), 0.0);
    }

    #[test]
    fn log_sum_is_symmetric() {
        let pairs = [(-1.0f32, -2.5f32), (-10.0, -0.25), (-7.3, -7.3)];
        for (x, y) in pairs {
            assert_eq!(log_sum(x, y), log_sum(y, x));
        }
    }

    #[test]
    fn normal_space_agrees_with_log_space() {
        let x: f32 = -2.0;
        let y: f32 = -3.0;
        let log = LogSpace::sum(x, y);
        let normal = NormalSpace::sum(x.exp(), y.exp());
        assert!((log.exp() - normal).abs() < 1e-4);

        let log = LogSpace::prod(x, y);
        let normal = NormalSpace::prod(x.exp(), y.exp());
        assert!((log.exp() - normal).abs() < 1e-6);
    }
}
