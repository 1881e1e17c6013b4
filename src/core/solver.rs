use tracing::debug;

use super::error::CalculationError;
use super::money::format_currency;
use super::simulator::simulate;
use super::types::{CalculationMode, CalculationResult, Frequency, ScenarioInput, Solved};

/// Solved durations beyond this horizon are reported as unreachable rather
/// than simulated.
pub const MAX_SOLVED_YEARS: f64 = 1_000.0;

#[derive(Debug, Clone, Copy)]
struct PeriodTerms {
    frequency: Frequency,
    periods: f64,
    rate: f64,
    periods_per_year: f64,
}

impl PeriodTerms {
    fn for_scenario(scenario: &ScenarioInput) -> Self {
        let periods_per_year = scenario.frequency.periods_per_year() as f64;
        Self {
            frequency: scenario.frequency,
            periods: scenario.years * periods_per_year,
            rate: scenario.annual_rate_percent / 100.0 / periods_per_year,
            periods_per_year,
        }
    }

    /// Scales a per-period payment to the monthly-equivalent contribution the
    /// simulator stores.
    fn monthly_equivalent(self, payment: f64) -> f64 {
        match self.frequency {
            Frequency::Monthly => payment,
            Frequency::Annually => payment / 12.0,
        }
    }

    /// Inverse of `monthly_equivalent`.
    fn native_payment(self, monthly_contribution: f64) -> f64 {
        match self.frequency {
            Frequency::Monthly => monthly_contribution,
            Frequency::Annually => monthly_contribution * 12.0,
        }
    }
}

pub fn calculate(
    scenario: &ScenarioInput,
    mode: CalculationMode,
) -> Result<CalculationResult, CalculationError> {
    match mode {
        CalculationMode::EndAmount => Ok(simulate(scenario)),
        CalculationMode::AdditionalContribution => solve_for_contribution(scenario),
        CalculationMode::InvestmentLength => solve_for_length(scenario),
    }
}

/// Dispatches on a textual mode key, failing with `InvalidMode` when the key
/// is not recognised.
pub fn calculate_by_key(
    scenario: &ScenarioInput,
    mode_key: &str,
) -> Result<CalculationResult, CalculationError> {
    let mode = mode_key.parse::<CalculationMode>()?;
    calculate(scenario, mode)
}

/// Finds the contribution per period that grows the starting amount to the
/// target over `years`, using the ordinary annuity future-value identity.
pub fn solve_for_contribution(
    scenario: &ScenarioInput,
) -> Result<CalculationResult, CalculationError> {
    validate_target(scenario)?;

    let terms = PeriodTerms::for_scenario(scenario);
    let shortfall = scenario.target_amount - scenario.starting_amount;

    let payment = if terms.rate == 0.0 {
        shortfall / terms.periods
    } else {
        let growth = (1.0 + terms.rate).powf(terms.periods);
        let payment = (scenario.target_amount - scenario.starting_amount * growth)
            / ((growth - 1.0) / terms.rate);
        if payment <= 0.0 {
            debug!(payment, "starting amount alone covers target");
            return Err(CalculationError::UnreachableTarget);
        }
        payment
    };
    if !payment.is_finite() {
        debug!(periods = terms.periods, "no finite payment over horizon");
        return Err(CalculationError::UnreachableTarget);
    }

    debug!(payment, rate = terms.rate, periods = terms.periods, "solved contribution");
    let mut result = simulate(&ScenarioInput {
        periodic_contribution: terms.monthly_equivalent(payment),
        ..*scenario
    });
    result.solved = Solved::Contribution(payment);
    result.summary_message = format!(
        "To reach {}, you need to contribute {} per {}.",
        format_currency(scenario.target_amount),
        format_currency(payment),
        scenario.frequency.period_label()
    );
    Ok(result)
}

/// Finds how many years the current contribution needs to reach the target.
///
/// Monthly durations are re-simulated up to the first month that reaches
/// the target; annual durations are truncated to whole years.
pub fn solve_for_length(scenario: &ScenarioInput) -> Result<CalculationResult, CalculationError> {
    validate_target(scenario)?;

    let terms = PeriodTerms::for_scenario(scenario);
    let r = terms.rate;
    let payment = terms.native_payment(scenario.periodic_contribution);
    let start = scenario.starting_amount;
    let target = scenario.target_amount;

    let mut contributions_needed = true;
    let periods = if r == 0.0 {
        if payment <= 0.0 {
            return Err(CalculationError::InvalidContribution);
        }
        (target - start) / payment
    } else if r > 0.0 && start * r >= payment && payment <= 0.0 {
        contributions_needed = false;
        (target / start).ln() / (1.0 + r).ln()
    } else {
        ((target * r + payment) / (start * r + payment)).ln() / (1.0 + r).ln()
    };

    if !periods.is_finite() || periods < 0.0 {
        debug!(periods, "duration has no finite solution");
        return Err(CalculationError::UnreachableTarget);
    }

    let years = periods / terms.periods_per_year;
    if years > MAX_SOLVED_YEARS {
        debug!(years, "duration exceeds solvable horizon");
        return Err(CalculationError::UnreachableTarget);
    }

    debug!(years, contributions_needed, "solved investment length");
    let mut result = simulate(&ScenarioInput {
        years,
        ..*scenario
    });
    result.solved = Solved::Years(years);
    result.summary_message = if contributions_needed {
        format!(
            "It will take approximately {years:.1} years to reach {}.",
            format_currency(target)
        )
    } else {
        format!(
            "It will take approximately {years:.1} years to reach {} with no additional contributions.",
            format_currency(target)
        )
    };
    Ok(result)
}

fn validate_target(scenario: &ScenarioInput) -> Result<(), CalculationError> {
    if scenario.target_amount <= scenario.starting_amount {
        return Err(CalculationError::InvalidTarget);
    }
    Ok(())
}
