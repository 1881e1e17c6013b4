use super::money::format_currency;
use super::types::{CalculationResult, Frequency, ScenarioInput, Solved, YearlyRecord};

const MONTHS_PER_YEAR: u64 = 12;
// Upper bound on records reserved up front; longer horizons grow the vec.
const PREALLOCATED_YEARS: u64 = 1_024;

#[derive(Debug)]
struct Ledger {
    balance: f64,
    principal: f64,
    records: Vec<YearlyRecord>,
}

impl Ledger {
    fn open(starting_amount: f64, years: u64) -> Self {
        Self {
            balance: starting_amount,
            principal: starting_amount,
            records: Vec::with_capacity(years.min(PREALLOCATED_YEARS) as usize),
        }
    }

    fn contribute(&mut self, amount: f64) {
        self.balance += amount;
        self.principal += amount;
    }

    fn accrue(&mut self, rate: f64) -> f64 {
        let interest = self.balance * rate;
        self.balance += interest;
        interest
    }

    fn close_year(&mut self, year: u64, starting_balance: f64, interest_earned: f64) {
        self.records.push(YearlyRecord {
            year,
            starting_balance,
            interest_earned,
            total_contributions: self.principal,
            ending_balance: self.balance,
        });
    }
}

/// Projects a fully specified scenario period by period.
///
/// Monthly scenarios accrue interest before each contribution. Annual
/// scenarios deposit a full year of contributions before the year's
/// interest is applied, and only whole years are simulated.
///
/// Step counts are `u64`; a horizon whose month count does not fit
/// saturates at `u64::MAX`, far beyond anything that finishes in practice.
pub fn simulate(scenario: &ScenarioInput) -> CalculationResult {
    let ledger = match scenario.frequency {
        Frequency::Monthly => simulate_monthly(scenario),
        Frequency::Annually => simulate_annually(scenario),
    };

    let summary_message = format!(
        "After {} years, your investment is projected to be {}.",
        scenario.years,
        format_currency(ledger.balance)
    );

    CalculationResult {
        end_balance: ledger.balance,
        total_principal: ledger.principal,
        total_interest: ledger.balance - ledger.principal,
        yearly_breakdown: ledger.records,
        summary_message,
        solved: Solved::None,
    }
}

/// Months simulated for a horizon: every started month counts, so the
/// breakdown holds exactly `ceil(years)` records.
pub(crate) fn monthly_step_count(years: f64) -> u64 {
    if years.is_nan() || years <= 0.0 {
        return 0;
    }
    to_step_count((years * MONTHS_PER_YEAR as f64).ceil())
}

pub(crate) fn annual_step_count(years: f64) -> u64 {
    if years.is_nan() || years <= 0.0 {
        return 0;
    }
    to_step_count(years.floor())
}

fn to_step_count(steps: f64) -> u64 {
    if steps >= u64::MAX as f64 {
        u64::MAX
    } else {
        steps as u64
    }
}

fn simulate_monthly(scenario: &ScenarioInput) -> Ledger {
    let months = monthly_step_count(scenario.years);
    let monthly_rate = scenario.annual_rate_percent / 100.0 / MONTHS_PER_YEAR as f64;
    let mut ledger = Ledger::open(scenario.starting_amount, months.div_ceil(MONTHS_PER_YEAR));

    let mut year_start_balance = ledger.balance;
    let mut year_interest = 0.0;
    for month in 1..=months {
        year_interest += ledger.accrue(monthly_rate);
        ledger.contribute(scenario.periodic_contribution);

        if month % MONTHS_PER_YEAR == 0 || month == months {
            ledger.close_year(
                month.div_ceil(MONTHS_PER_YEAR),
                year_start_balance,
                year_interest,
            );
            year_start_balance = ledger.balance;
            year_interest = 0.0;
        }
    }

    ledger
}

fn simulate_annually(scenario: &ScenarioInput) -> Ledger {
    let years = annual_step_count(scenario.years);
    let annual_rate = scenario.annual_rate_percent / 100.0;
    let annual_contribution = scenario.periodic_contribution * MONTHS_PER_YEAR as f64;
    let mut ledger = Ledger::open(scenario.starting_amount, years);

    for year in 1..=years {
        let year_start_balance = ledger.balance;
        ledger.contribute(annual_contribution);
        let interest = ledger.accrue(annual_rate);
        ledger.close_year(year, year_start_balance, interest);
    }

    ledger
}
