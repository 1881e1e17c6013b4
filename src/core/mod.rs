mod error;
mod money;
mod simulator;
mod solver;
mod types;

pub use error::CalculationError;
pub use money::format_currency;
pub use simulator::simulate;
pub use solver::{
    MAX_SOLVED_YEARS, calculate, calculate_by_key, solve_for_contribution, solve_for_length,
};
pub use types::{CalculationMode, CalculationResult, Frequency, ScenarioInput, Solved, YearlyRecord};
