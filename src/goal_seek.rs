//! Goal seek for the maximum spend of a single ad
//!
//! Bisection over [0, approved ceiling] for the largest spend of the targeted ad that keeps the
//! total campaign cost within the ceiling. The cost model is non-decreasing in every ad spend
//! (all rates are non-negative), so "total cost > ceiling" splits the interval at a single threshold.
//!
//! The search never touches the caller's spends: it works on a private copy of the vector.

use std::sync::atomic::Ordering;
use crate::budget::{evaluate, FeeParameters};
use crate::logger::{Logger, LogEvent};
use crate::utils::{self, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, TOTAL_SEARCHES};
use crate::logln;
use crate::warnln;

/// Reasons a goal seek can fail
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeekError {
    /// Iteration budget ran out while the interval was still wider than the tolerance
    #[error(
        "Goal seek did not converge within the allowed number of iterations ({max_iterations}); \
         interval [{low:.4}, {high:.4}] is still wider than {tolerance}"
    )]
    NotConverged {
        max_iterations: usize,
        low: f64,
        high: f64,
        tolerance: f64,
    },

    /// The request violates a precondition; the search was never started
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

impl SeekError {
    fn invalid(reason: impl Into<String>) -> Self {
        SeekError::InvalidArgument { reason: reason.into() }
    }

    /// True when the search ran and ran out of iterations
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, SeekError::NotConverged { .. })
    }
}

/// Stopping parameters of the bisection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SeekSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Everything needed to solve for the maximum spend of one ad
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub spends: Vec<f64>,
    pub target_index: usize,
    pub approved_ceiling: f64,
    pub fees: FeeParameters,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl SearchRequest {
    /// Create a request with the default tolerance and iteration cap
    pub fn new(spends: Vec<f64>, target_index: usize, approved_ceiling: f64, fees: FeeParameters) -> Self {
        Self {
            spends,
            target_index,
            approved_ceiling,
            fees,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_settings(
        spends: Vec<f64>,
        target_index: usize,
        approved_ceiling: f64,
        fees: FeeParameters,
        settings: SeekSettings,
    ) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
            ..Self::new(spends, target_index, approved_ceiling, fees)
        }
    }

    /// Check every precondition of the search
    ///
    /// A zero iteration cap is accepted: it either converges immediately on an empty interval
    /// or fails with `NotConverged`.
    pub fn validate(&self) -> Result<(), SeekError> {
        if self.target_index >= self.spends.len() {
            return Err(SeekError::invalid(format!(
                "target index {} is out of range for {} ads",
                self.target_index,
                self.spends.len()
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SeekError::invalid(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        check_rate("agency fee rate", self.fees.agency_fee_rate)?;
        check_rate("third-party fee rate", self.fees.third_party_fee_rate)?;
        check_amount("fixed cost", self.fees.fixed_cost)?;
        check_amount("approved ceiling", self.approved_ceiling)?;
        for (index, &spend) in self.spends.iter().enumerate() {
            check_amount(&format!("spend of ad {}", utils::ad_label(index)), spend)?;
        }
        Ok(())
    }
}

fn check_rate(name: &str, rate: f64) -> Result<(), SeekError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(SeekError::invalid(format!("{} must be between 0 and 1, got {}", name, rate)))
    }
}

fn check_amount(name: &str, amount: f64) -> Result<(), SeekError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(SeekError::invalid(format!("{} must be a non-negative number, got {}", name, amount)))
    }
}

/// Converged search with the details callers may want to report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekOutcome {
    /// Midpoint of the final interval
    pub max_spend: f64,
    /// Bisection steps taken
    pub iterations: usize,
    /// Total campaign cost with `max_spend` substituted for the targeted ad
    pub total_cost: f64,
    pub low: f64,
    pub high: f64,
}

/// State after one bisection step
struct BisectionStep {
    iteration: usize,
    midpoint: f64,
    total_cost: f64,
    within_ceiling: bool,
    low: f64,
    high: f64,
}

/// Maximum spend for `request.target_index` keeping the total within the approved ceiling
pub fn solve(request: &SearchRequest) -> Result<f64, SeekError> {
    bisect(request, |_| {}).map(|outcome| outcome.max_spend)
}

/// Same search as [`solve`], logging each step as `Iteration` and the result as `Convergence`
pub fn solve_logged(request: &SearchRequest, logger: &mut Logger) -> Result<SeekOutcome, SeekError> {
    let target = utils::ad_label(request.target_index);
    let result = bisect(request, |step| {
        logln!(
            logger,
            LogEvent::Iteration,
            "{} iter {:>4}: spend {:.4} -> total {:.4} ({}), interval [{:.4}, {:.4}]",
            target,
            step.iteration,
            step.midpoint,
            step.total_cost,
            if step.within_ceiling { "within" } else { "over" },
            step.low,
            step.high
        );
    });

    match &result {
        Ok(outcome) => {
            logln!(
                logger,
                LogEvent::Convergence,
                "{}: converged after {} iterations in [{:.4}, {:.4}], max spend {:.2}, total cost {:.2} of {:.2}",
                target,
                outcome.iterations,
                outcome.low,
                outcome.high,
                outcome.max_spend,
                outcome.total_cost,
                request.approved_ceiling
            );
        }
        Err(e) => {
            warnln!(logger, LogEvent::Convergence, "{}: {}", target, e);
        }
    }
    result
}

fn bisect<F>(request: &SearchRequest, mut on_step: F) -> Result<SeekOutcome, SeekError>
where
    F: FnMut(&BisectionStep),
{
    request.validate()?;
    TOTAL_SEARCHES.fetch_add(1, Ordering::Relaxed);

    let mut spends = request.spends.clone();
    let mut low = 0.0;
    let mut high = request.approved_ceiling;
    let mut iterations = 0;

    while high - low > request.tolerance {
        if iterations >= request.max_iterations {
            return Err(SeekError::NotConverged {
                max_iterations: request.max_iterations,
                low,
                high,
                tolerance: request.tolerance,
            });
        }

        let midpoint = (low + high) / 2.0;
        spends[request.target_index] = midpoint;
        let total_cost = evaluate(&spends, request.fees);

        let within_ceiling = total_cost <= request.approved_ceiling;
        if within_ceiling {
            low = midpoint;
        } else {
            high = midpoint;
        }
        iterations += 1;

        on_step(&BisectionStep {
            iteration: iterations,
            midpoint,
            total_cost,
            within_ceiling,
            low,
            high,
        });
    }

    let max_spend = (low + high) / 2.0;
    spends[request.target_index] = max_spend;
    Ok(SeekOutcome {
        max_spend,
        iterations,
        total_cost: evaluate(&spends, request.fees),
        low,
        high,
    })
}
