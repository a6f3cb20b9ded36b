use std::error::Error;
use std::sync::atomic::Ordering;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Distribution;
use crate::budget::{evaluate, FeeParameters};
use crate::goal_seek::{solve_logged, SearchRequest, SeekSettings};
use crate::logger::{Logger, LogEvent};
use crate::scenarios::validate_outcome;
use crate::utils::{self, RAND_SEED};
use crate::{log, logln};

const MAX_ADS: usize = 6;

/// Build the random campaign for `seed`: 1 to 6 ads with log-normal spends, random fee rates
/// and a ceiling somewhere around the cost of the campaign as given
pub fn random_request(seed: u64, settings: SeekSettings) -> Result<SearchRequest, Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let spend_dist = utils::lognormal_dist(1000.0, 600.0)?;

    let ad_count = rng.gen_range(1..=MAX_ADS);
    let spends: Vec<f64> = (0..ad_count).map(|_| spend_dist.sample(&mut rng)).collect();
    let fees = FeeParameters::new(
        rng.gen_range(0.0..=0.2),
        rng.gen_range(0.0..=0.1),
        rng.gen_range(0.0..500.0),
    );
    let target_index = rng.gen_range(0..ad_count);

    // Between half and one and a half times the current cost, so some campaigns leave no room at all
    let approved_ceiling = evaluate(&spends, fees) * rng.gen_range(0.5..1.5);

    Ok(SearchRequest::with_settings(spends, target_index, approved_ceiling, fees, settings))
}

/// Solve and validate one random campaign
pub fn run_seed(seed: u64, settings: SeekSettings, logger: &mut Logger) -> Result<(), Box<dyn Error>> {
    let request = random_request(seed, settings)?;
    let outcome = solve_logged(&request, logger)?;
    let errors = validate_outcome(&request, &outcome);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("seed {}: {}", seed, errors.join("; ")).into())
    }
}

/// Run `runs` consecutive seeds starting at `start_seed`, wrapping past `u64::MAX`
///
/// # Returns
/// The number of failed seeds
pub fn run_sweep(
    runs: u64,
    start_seed: u64,
    settings: SeekSettings,
    fastbreak: bool,
    logger: &mut Logger,
) -> usize {
    let mut failures = 0;

    for n in 0..runs {
        let seed = start_seed.wrapping_add(n);
        RAND_SEED.store(seed, Ordering::Relaxed);
        log!(logger, LogEvent::Validation, "[{}/{}] ", n + 1, runs);
        match run_seed(seed, settings, logger) {
            Ok(()) => {
                logln!(logger, LogEvent::Validation, "✓");
            }
            Err(e) => {
                failures += 1;
                logln!(logger, LogEvent::Validation, "✗ {}", e);
                if fastbreak {
                    logln!(
                        logger,
                        LogEvent::Validation,
                        "\nStopping sweep due to failure (--fastbreak enabled)"
                    );
                    break;
                }
            }
        }
    }

    logln!(logger, LogEvent::Validation, "\n{} of {} random campaigns failed", failures, runs);
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryReceiver;
    use std::sync::Mutex;

    // Sweeps write the shared RAND_SEED; run them one at a time
    static SWEEP_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_same_seed_same_campaign() {
        let a = random_request(11, SeekSettings::default()).unwrap();
        let b = random_request(11, SeekSettings::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_requests_are_valid() {
        for seed in 0..200 {
            let request = random_request(seed, SeekSettings::default()).unwrap();
            assert!(request.validate().is_ok(), "seed {}: {:?}", seed, request);
            assert!(request.spends.len() <= MAX_ADS);
        }
    }

    #[test]
    fn test_sweep_passes() {
        let _guard = SWEEP_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut logger = Logger::new();
        assert_eq!(run_sweep(300, 0, SeekSettings::default(), false, &mut logger), 0);
    }

    #[test]
    fn test_sweep_wraps_past_largest_seed() {
        let _guard = SWEEP_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut logger = Logger::new();
        let (receiver, buffer) = MemoryReceiver::new(vec![LogEvent::Validation]);
        logger.add_receiver(receiver);

        // u64::MAX - 1, u64::MAX, 0, 1
        let failures = run_sweep(4, u64::MAX - 1, SeekSettings::default(), false, &mut logger);

        let report = buffer.borrow();
        assert_eq!(failures, 0);
        assert!(report.contains("[4/4] "), "{}", report);
        assert!(report.contains("0 of 4 random campaigns failed"));
        assert_eq!(RAND_SEED.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_sweep_records_current_seed() {
        let _guard = SWEEP_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut logger = Logger::new();
        run_sweep(2, 4242, SeekSettings::default(), false, &mut logger);
        assert_eq!(RAND_SEED.load(Ordering::Relaxed), 4243);
    }

    #[test]
    fn test_sweep_reports_convergence_failures() {
        let _guard = SWEEP_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut logger = Logger::new();
        let settings = SeekSettings { tolerance: 1e-6, max_iterations: 2 };
        assert_eq!(run_sweep(10, 0, settings, false, &mut logger), 10);
    }
}
