use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalculationError {
    /// Target does not exceed the starting amount.
    InvalidTarget,
    /// No finite, positive solution exists for the given rate and contribution.
    UnreachableTarget,
    /// Duration solve at zero interest with a non-positive contribution.
    InvalidContribution,
    InvalidMode(String),
}

impl CalculationError {
    pub fn kind(&self) -> &'static str {
        match self {
            CalculationError::InvalidTarget => "invalid-target",
            CalculationError::UnreachableTarget => "unreachable-target",
            CalculationError::InvalidContribution => "invalid-contribution",
            CalculationError::InvalidMode(_) => "invalid-mode",
        }
    }
}

impl fmt::Display for CalculationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationError::InvalidTarget => {
                write!(f, "target amount must be greater than starting amount")
            }
            CalculationError::UnreachableTarget => write!(
                f,
                "target cannot be reached with these contributions and interest rate"
            ),
            CalculationError::InvalidContribution => {
                write!(f, "contributions must be positive if interest rate is zero")
            }
            CalculationError::InvalidMode(key) => write!(f, "invalid calculation mode: {key}"),
        }
    }
}

impl std::error::Error for CalculationError {}
