use serde::Serialize;

use super::domain::LivingHistory;

/// Months of residence history a lender needs on file.
pub const REQUIRED_HISTORY_MONTHS: u32 = 24;

/// Derived view of how much residence history an applicant has declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResidenceSummary {
    pub current_months: u32,
    pub total_months: u32,
    pub sufficient_history: bool,
    /// The UI should prompt for another previous residence.
    pub needs_previous_residence: bool,
}

impl ResidenceSummary {
    /// The current residence covers the requirement on its own, so previous
    /// residences are never consulted.
    pub fn current_is_sufficient(&self) -> bool {
        self.current_months >= REQUIRED_HISTORY_MONTHS
    }
}

pub struct ResidenceHistory;

impl ResidenceHistory {
    pub fn evaluate(history: &LivingHistory) -> ResidenceSummary {
        let current_months = history.current.total_months();
        let total_months = current_months
            + history
                .previous
                .iter()
                .map(|residence| residence.total_months())
                .sum::<u32>();
        let sufficient_history = total_months >= REQUIRED_HISTORY_MONTHS;

        ResidenceSummary {
            current_months,
            total_months,
            sufficient_history,
            needs_previous_residence: !sufficient_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::application::domain::{CurrentResidence, PreviousResidence};

    fn history(current: (u8, u8), previous: &[(u8, u8)]) -> LivingHistory {
        LivingHistory {
            current: CurrentResidence {
                years: Some(current.0),
                months: Some(current.1),
                ..CurrentResidence::default()
            },
            previous: previous
                .iter()
                .map(|(years, months)| PreviousResidence {
                    years: Some(*years),
                    months: Some(*months),
                    ..PreviousResidence::default()
                })
                .collect(),
        }
    }

    #[test]
    fn sums_current_and_previous_durations() {
        let summary = ResidenceHistory::evaluate(&history((0, 10), &[(1, 8)]));
        assert_eq!(summary.current_months, 10);
        assert_eq!(summary.total_months, 30);
        assert!(summary.sufficient_history);
        assert!(!summary.needs_previous_residence);
        assert!(!summary.current_is_sufficient());
    }

    #[test]
    fn short_history_asks_for_previous_residence() {
        let summary = ResidenceHistory::evaluate(&history((0, 10), &[]));
        assert_eq!(summary.total_months, 10);
        assert!(!summary.sufficient_history);
        assert!(summary.needs_previous_residence);
    }

    #[test]
    fn exactly_two_years_is_sufficient() {
        let summary = ResidenceHistory::evaluate(&history((2, 0), &[]));
        assert!(summary.sufficient_history);
        assert!(summary.current_is_sufficient());
    }

    #[test]
    fn missing_values_count_as_zero() {
        let summary = ResidenceHistory::evaluate(&LivingHistory::default());
        assert_eq!(summary.total_months, 0);
        assert!(summary.needs_previous_residence);
    }
}
