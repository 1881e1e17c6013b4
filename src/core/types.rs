use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::error::CalculationError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(alias = "monthly")]
    Monthly,
    #[serde(alias = "annually", alias = "annual", alias = "yearly")]
    Annually,
}

impl Frequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Annually => 1,
        }
    }

    pub fn period_label(self) -> &'static str {
        match self {
            Frequency::Monthly => "month",
            Frequency::Annually => "year",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CalculationMode {
    #[serde(alias = "end-amount", alias = "endAmount", alias = "end_amount")]
    EndAmount,
    #[serde(
        alias = "additional-contribution",
        alias = "additionalContribution",
        alias = "additional_contribution"
    )]
    AdditionalContribution,
    #[serde(
        alias = "investment-length",
        alias = "investmentLength",
        alias = "investment_length"
    )]
    InvestmentLength,
}

impl FromStr for CalculationMode {
    type Err = CalculationError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let normalized: String = key
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "endamount" => Ok(CalculationMode::EndAmount),
            "additionalcontribution" => Ok(CalculationMode::AdditionalContribution),
            "investmentlength" => Ok(CalculationMode::InvestmentLength),
            _ => Err(CalculationError::InvalidMode(key.to_string())),
        }
    }
}

/// One fully specified calculation request.
///
/// Amounts are taken as given: negative values are not clamped and flow
/// through the math unchanged. `periodic_contribution` is always the
/// monthly-equivalent amount, even when `frequency` is `Annually`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    #[serde(alias = "initialAmount")]
    pub starting_amount: f64,
    #[serde(alias = "monthlyContribution")]
    pub periodic_contribution: f64,
    pub years: f64,
    #[serde(alias = "interestRate")]
    pub annual_rate_percent: f64,
    #[serde(alias = "contributionFrequency")]
    pub frequency: Frequency,
    pub target_amount: f64,
}

impl Default for ScenarioInput {
    fn default() -> Self {
        Self {
            starting_amount: 10_000.0,
            periodic_contribution: 500.0,
            years: 20.0,
            annual_rate_percent: 7.0,
            frequency: Frequency::Monthly,
            target_amount: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRecord {
    pub year: u64,
    pub starting_balance: f64,
    pub interest_earned: f64,
    pub total_contributions: f64,
    pub ending_balance: f64,
}

impl YearlyRecord {
    /// Interest earned from the start of the scenario up to the end of this year.
    pub fn accumulated_interest(&self) -> f64 {
        self.ending_balance - self.total_contributions
    }
}

/// Which parameter a goal solve derived, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solved {
    None,
    Contribution(f64),
    Years(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationResult {
    pub end_balance: f64,
    pub total_principal: f64,
    pub total_interest: f64,
    pub yearly_breakdown: Vec<YearlyRecord>,
    pub summary_message: String,
    pub solved: Solved,
}

impl CalculationResult {
    /// Contribution per native period (per year when the scenario is annual).
    pub fn solved_contribution(&self) -> Option<f64> {
        match self.solved {
            Solved::Contribution(value) => Some(value),
            _ => None,
        }
    }

    pub fn solved_years(&self) -> Option<f64> {
        match self.solved {
            Solved::Years(value) => Some(value),
            _ => None,
        }
    }
}

impl Serialize for CalculationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CalculationResult", 7)?;
        state.serialize_field("endBalance", &self.end_balance)?;
        state.serialize_field("totalPrincipal", &self.total_principal)?;
        state.serialize_field("totalInterest", &self.total_interest)?;
        state.serialize_field("yearlyBreakdown", &self.yearly_breakdown)?;
        state.serialize_field("summaryMessage", &self.summary_message)?;
        match self.solved {
            Solved::Contribution(value) => {
                state.serialize_field("solvedContribution", &value)?;
                state.skip_field("solvedYears")?;
            }
            Solved::Years(value) => {
                state.skip_field("solvedContribution")?;
                state.serialize_field("solvedYears", &value)?;
            }
            Solved::None => {
                state.skip_field("solvedContribution")?;
                state.skip_field("solvedYears")?;
            }
        }
        state.end()
    }
}
