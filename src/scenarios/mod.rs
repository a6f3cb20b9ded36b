use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use crate::budget::{breakdown, evaluate, marginal_rate, FeeParameters};
use crate::goal_seek::{solve_logged, SearchRequest, SeekOutcome, SeekSettings};
use crate::logger::{Logger, LogEvent, FileReceiver, sanitize_filename};
use crate::utils::{self, VERBOSE_SEARCH};
use crate::{errln, log, logln};

/// A fixed campaign with a listed target value for the goal seek
///
/// `listed_target` is shown next to the solved value for comparison; validation checks the solved
/// value against the cost model, not against the listed number.
#[derive(Debug, Clone)]
pub struct CampaignCase {
    /// Position in the catalog listing
    pub ordinal: usize,
    pub short_name: &'static str,
    pub spends: &'static [f64],
    pub agency_fee_rate: f64,
    pub third_party_fee_rate: f64,
    pub fixed_cost: f64,
    pub approved_budget: f64,
    /// 0-based index of the ad to optimize
    pub ad_index: usize,
    pub listed_target: f64,
}

impl CampaignCase {
    pub fn fees(&self) -> FeeParameters {
        FeeParameters::new(self.agency_fee_rate, self.third_party_fee_rate, self.fixed_cost)
    }

    pub fn request(&self, settings: SeekSettings) -> SearchRequest {
        SearchRequest::with_settings(self.spends.to_vec(), self.ad_index, self.approved_budget, self.fees(), settings)
    }
}

// Create an inventory collection for campaign cases
inventory::collect!(CampaignCase);

/// Get all registered cases from the catalog, in listing order
pub fn get_case_catalog() -> Vec<CampaignCase> {
    let mut cases: Vec<CampaignCase> = inventory::iter::<CampaignCase>
        .into_iter()
        .cloned()
        .collect();
    cases.sort_by_key(|case| case.ordinal);
    cases
}

pub mod reference_table;

/// Check a converged search against the cost model
///
/// # Returns
/// One message per violated property; empty when the outcome is valid
pub fn validate_outcome(request: &SearchRequest, outcome: &SeekOutcome) -> Vec<String> {
    let mut errors = Vec::new();
    let index = request.target_index;
    let ceiling = request.approved_ceiling;

    if !(outcome.max_spend >= 0.0 && outcome.max_spend <= ceiling) {
        errors.push(format!("max spend {:.4} is outside [0, {:.2}]", outcome.max_spend, ceiling));
    }

    let mut spends = request.spends.clone();
    spends[index] = outcome.max_spend + request.tolerance;
    let above = evaluate(&spends, request.fees);
    if above <= ceiling {
        errors.push(format!(
            "max spend {:.4} is not tight: {:.4} more still costs {:.4} <= {:.2}",
            outcome.max_spend, request.tolerance, above, ceiling
        ));
    }

    spends[index] = 0.0;
    if evaluate(&spends, request.fees) <= ceiling {
        let slack = marginal_rate(index, request.fees) * request.tolerance;
        if outcome.total_cost > ceiling + slack {
            errors.push(format!(
                "total cost {:.4} exceeds ceiling {:.2} by more than {:.4}",
                outcome.total_cost, ceiling, slack
            ));
        }
    }

    errors
}

/// Print the inputs of a case, run its goal seek and validate the result
pub fn run_case(case: &CampaignCase, settings: SeekSettings, logger: &mut Logger) -> Result<SeekOutcome, Box<dyn Error>> {
    let request = case.request(settings);
    let budgets: Vec<String> = case.spends.iter().map(|spend| spend.to_string()).collect();

    logln!(logger, LogEvent::Scenario, "");
    logln!(logger, LogEvent::Scenario, "Ad Budgets: {}", budgets.join(", "));
    logln!(logger, LogEvent::Scenario, "Agency Fee Percentage: {:.2}%", case.agency_fee_rate * 100.0);
    logln!(logger, LogEvent::Scenario, "Third-Party Fee Percentage: {:.2}%", case.third_party_fee_rate * 100.0);
    logln!(logger, LogEvent::Scenario, "Fixed Agency Hours Cost: {}", case.fixed_cost);
    logln!(logger, LogEvent::Scenario, "Approved Budget: {}", case.approved_budget);
    logln!(logger, LogEvent::Scenario, "Ad Index to Optimize: {}", case.ad_index + 1);

    let search_receiver_id = if VERBOSE_SEARCH.load(Ordering::Relaxed) {
        let path = PathBuf::from(format!("log/{}/search.log", sanitize_filename(case.short_name)));
        Some(logger.add_receiver(FileReceiver::new(&path, vec![LogEvent::Iteration, LogEvent::Convergence])?))
    } else {
        None
    };

    let result = solve_logged(&request, logger);

    if let Some(id) = search_receiver_id {
        logger.remove_receiver(id);
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_convergence_failure() {
                logln!(logger, LogEvent::Scenario, "Goal seek failed: {}", e);
            } else {
                errln!(logger, LogEvent::Scenario, "Case '{}' is not a valid goal seek: {}", case.short_name, e);
            }
            return Err(e.into());
        }
    };

    let label = utils::ad_label(case.ad_index);
    logln!(logger, LogEvent::Scenario, "ExpectedMaxBudget (Target value): {:.2}", case.listed_target);
    logln!(logger, LogEvent::Scenario, "The maximum budget for ad {} is: {:.2}", label, outcome.max_spend);

    let mut solved_spends = request.spends.clone();
    solved_spends[request.target_index] = outcome.max_spend;
    let parts = breakdown(&solved_spends, request.fees);
    logln!(
        logger,
        LogEvent::Scenario,
        "Total cost: {:.2} = ad spend {:.2} + agency fee {:.2} + third-party fee {:.2} + fixed cost {:.2}",
        parts.total,
        parts.total_ad_spend,
        parts.agency_fee,
        parts.third_party_fee,
        parts.fixed_cost
    );

    let errors = validate_outcome(&request, &outcome);
    if errors.is_empty() {
        Ok(outcome)
    } else {
        for error in &errors {
            errln!(logger, LogEvent::Scenario, "✗ {}", error);
        }
        Err(format!("Case '{}' validation failed:\n{}", case.short_name, errors.join("\n")).into())
    }
}

/// Run every catalog case, reporting pass/fail on the Validation event
///
/// # Returns
/// The number of failed cases
pub fn run_catalog(settings: SeekSettings, fastbreak: bool, logger: &mut Logger) -> usize {
    let mut failures = 0;

    for case in get_case_catalog() {
        log!(logger, LogEvent::Validation, "{}: ", case.short_name);
        match run_case(&case, settings, logger) {
            Ok(_) => {
                logln!(logger, LogEvent::Validation, "✓ PASSED");
            }
            Err(e) => {
                failures += 1;
                logln!(logger, LogEvent::Validation, "✗ FAILED: {}", e);
                if fastbreak {
                    logln!(logger, LogEvent::Validation, "\nStopping case execution due to failure (--fastbreak enabled)");
                    break;
                }
            }
        }
        let _ = logger.flush();
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryReceiver;

    #[test]
    fn test_catalog_is_listed_in_order() {
        let cases = get_case_catalog();
        assert_eq!(cases.len(), 5);
        let ordinals: Vec<usize> = cases.iter().map(|case| case.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5]);
        assert!(cases.iter().all(|case| case.ad_index < case.spends.len()));
    }

    #[test]
    fn test_catalog_passes_with_default_settings() {
        let mut logger = Logger::new();
        assert_eq!(run_catalog(SeekSettings::default(), false, &mut logger), 0);
    }

    #[test]
    fn test_catalog_fails_with_tiny_iteration_cap() {
        let mut logger = Logger::new();
        let (receiver, buffer) = MemoryReceiver::new(vec![LogEvent::Scenario]);
        logger.add_receiver(receiver);

        let settings = SeekSettings { tolerance: 0.01, max_iterations: 1 };
        assert_eq!(run_catalog(settings, false, &mut logger), 5);
        assert_eq!(buffer.borrow().matches("Goal seek failed: ").count(), 5);
    }

    #[test]
    fn test_fastbreak_stops_at_first_failure() {
        let mut logger = Logger::new();
        let settings = SeekSettings { tolerance: 0.01, max_iterations: 1 };
        assert_eq!(run_catalog(settings, true, &mut logger), 1);
    }

    #[test]
    fn test_case_report_shows_inputs_and_result() {
        let case = get_case_catalog().remove(0);
        let mut logger = Logger::new();
        let (receiver, buffer) = MemoryReceiver::new(vec![LogEvent::Scenario]);
        logger.add_receiver(receiver);

        run_case(&case, SeekSettings::default(), &mut logger).unwrap();

        let report = buffer.borrow();
        assert!(report.contains("Ad Budgets: 500, 1000, 1500, 2000"));
        assert!(report.contains("Agency Fee Percentage: 10.00%"));
        assert!(report.contains("Ad Index to Optimize: 3"));
        assert!(report.contains("ExpectedMaxBudget (Target value): 1340.34"));
        assert!(report.contains("The maximum budget for ad X3 is: 613.6"));
    }

    #[test]
    fn test_validation_flags_loose_outcome() {
        let request = SearchRequest::new(vec![0.0], 0, 1000.0, FeeParameters::new(0.0, 0.0, 0.0));
        let outcome = SeekOutcome { max_spend: 500.0, iterations: 1, total_cost: 500.0, low: 500.0, high: 500.0 };
        let errors = validate_outcome(&request, &outcome);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not tight"));
    }

    #[test]
    fn test_validation_flags_overspend() {
        let request = SearchRequest::new(vec![0.0], 0, 1000.0, FeeParameters::new(0.0, 0.0, 0.0));
        let outcome = SeekOutcome { max_spend: 1000.0, iterations: 1, total_cost: 1200.0, low: 1000.0, high: 1000.0 };
        let errors = validate_outcome(&request, &outcome);
        assert!(errors.iter().any(|e| e.contains("exceeds ceiling")));
    }
}
