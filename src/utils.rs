use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize};
use rand_distr::{LogNormal, NormalError};

/// When set, every bisection step of a catalog case is written to log/<case>/search.log
pub static VERBOSE_SEARCH: AtomicBool = AtomicBool::new(false);

/// Seed of the random campaign currently being generated by a sweep
pub static RAND_SEED: AtomicU64 = AtomicU64::new(0);

/// Number of goal seeks performed by this process
pub static TOTAL_SEARCHES: AtomicUsize = AtomicUsize::new(0);

/// Width of the search interval below which the goal seek stops
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Bisection steps allowed before the goal seek gives up
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Convert mean and standard deviation to log-normal distribution parameters
/// Returns (μ, σ) for LogNormal(μ, σ) that approximates the given mean and stddev
///
/// - σ = sqrt(ln(1 + s²/m²))
/// - μ = ln(m) - σ²/2
fn lognormal_from_mean_stddev(mean: f64, stddev: f64) -> (f64, f64) {
    let variance = stddev * stddev;
    let sigma_squared = (1.0 + variance / (mean * mean)).ln();
    let sigma = sigma_squared.sqrt();
    let mu = mean.ln() - sigma_squared / 2.0;
    (mu, sigma)
}

/// Create a log-normal distribution from mean and standard deviation
pub fn lognormal_dist(mean: f64, stddev: f64) -> Result<LogNormal<f64>, NormalError> {
    let (mu, sigma) = lognormal_from_mean_stddev(mean, stddev);
    LogNormal::new(mu, sigma)
}

/// Human-facing ad label: index 0 is "X1"
pub fn ad_label(index: usize) -> String {
    format!("X{}", index + 1)
}

/// Parse a decimal number accepting either '.' or ',' as the decimal separator
///
/// Input that reads like thousands grouping ("1,000", "1,000.50", "1.000,5") is rejected
/// so the caller can ask again. "0,125" is still a decimal.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    let commas = text.matches(',').count();
    if commas > 1 || (commas == 1 && text.contains('.')) {
        return None;
    }
    if let Some((whole, fraction)) = text.split_once(',') {
        let whole = whole.trim_start_matches(['-', '+']);
        if fraction.len() == 3 && !whole.trim_start_matches('0').is_empty() {
            return None;
        }
    }
    text.replace(',', ".").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::Distribution;

    #[test]
    fn test_lognormal_mean_is_close() {
        let dist = lognormal_dist(1000.0, 300.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20000;
        let mean: f64 = (0..n).map(|_| dist.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 1000.0).abs() < 20.0, "mean was {}", mean);
    }

    #[test]
    fn test_ad_label_is_one_based() {
        assert_eq!(ad_label(0), "X1");
        assert_eq!(ad_label(3), "X4");
    }

    #[test]
    fn test_parse_decimal_accepts_comma() {
        assert_eq!(parse_decimal("0,10"), Some(0.10));
        assert_eq!(parse_decimal(" 12.5 \n"), Some(12.5));
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_parse_decimal_rejects_grouping_separators() {
        assert_eq!(parse_decimal("1,000"), None);
        assert_eq!(parse_decimal("12,500"), None);
        assert_eq!(parse_decimal("0,125"), Some(0.125));
        assert_eq!(parse_decimal("1,5"), Some(1.5));
        assert_eq!(parse_decimal("1,000,000"), None);
        assert_eq!(parse_decimal("1.000,5"), None);
        assert_eq!(parse_decimal("1,000.50"), None);
    }
}
