use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A calendar month, the granularity at which a household pools money.
///
/// Stored and exchanged as `YYYY-MM`. A household owns at most one
/// [`MonthlyBudget`] per `BudgetMonth`.
///
/// # Examples
///
/// ```rust
/// use engine::BudgetMonth;
///
/// let month: BudgetMonth = "2026-08".parse().unwrap();
/// assert_eq!(month.year(), 2026);
/// assert_eq!(month.month(), 8);
/// assert_eq!(month.to_string(), "2026-08");
/// ```
///
/// [`MonthlyBudget`]: crate::MonthlyBudget
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BudgetMonth {
    year: i32,
    month: u32,
}

impl BudgetMonth {
    /// Creates a month, rejecting values outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidMonth(format!(
                "month must be 1-12, got {month}"
            )));
        }
        if !(1970..=9999).contains(&year) {
            return Err(EngineError::InvalidMonth(format!("invalid year {year}")));
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BudgetMonth {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidMonth(format!("expected YYYY-MM, got \"{s}\""));

        let (year_str, month_str) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year_str.len() != 4 || month_str.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year_str.parse().map_err(|_| invalid())?;
        let month: u32 = month_str.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for BudgetMonth {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BudgetMonth> for String {
    fn from(value: BudgetMonth) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round() {
        let month: BudgetMonth = "2026-08".parse().unwrap();
        assert_eq!(month, BudgetMonth::new(2026, 8).unwrap());
        assert_eq!(month.to_string(), "2026-08");
        assert_eq!("1999-12".parse::<BudgetMonth>().unwrap().to_string(), "1999-12");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!("2026".parse::<BudgetMonth>().is_err());
        assert!("2026-13".parse::<BudgetMonth>().is_err());
        assert!("2026-0".parse::<BudgetMonth>().is_err());
        assert!("26-08".parse::<BudgetMonth>().is_err());
        assert!("2026-8".parse::<BudgetMonth>().is_err());
        assert!("".parse::<BudgetMonth>().is_err());
    }

    #[test]
    fn months_order_chronologically() {
        let a = BudgetMonth::new(2025, 12).unwrap();
        let b = BudgetMonth::new(2026, 1).unwrap();
        assert!(a < b);
    }
}
