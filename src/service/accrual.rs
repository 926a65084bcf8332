//! Referral milestone accrual.
//!
//! A hired referral pays 3 points once the hire completes 3 months, then 2
//! points at 6 months and at every further 6-month interval. The calculator
//! is a pure function: it reports what is owed and never touches the
//! referral, so callers must persist the new `points_earned` before the
//! next call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::referralmodel::ReferralStatus;

pub const FIRST_MILESTONE_MONTHS: i32 = 3;
pub const FIRST_MILESTONE_POINTS: i32 = 3;
pub const RECURRING_INTERVAL_MONTHS: i32 = 6;
pub const RECURRING_MILESTONE_POINTS: i32 = 2;

/// One hundred years of tenure; anything beyond is bad data.
pub const MAX_TRACKED_MONTHS: i32 = 1200;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccrualError {
    #[error("Invalid accrual input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub threshold_months: i32,
    pub points: i32,
}

impl Milestone {
    /// Zero-based position in the schedule: 0 is the 3-month bonus, n >= 1
    /// is the n-th 6-month interval.
    pub fn nth(index: i32) -> Self {
        if index == 0 {
            Milestone {
                threshold_months: FIRST_MILESTONE_MONTHS,
                points: FIRST_MILESTONE_POINTS,
            }
        } else {
            Milestone {
                threshold_months: index * RECURRING_INTERVAL_MONTHS,
                points: RECURRING_MILESTONE_POINTS,
            }
        }
    }
}

/// The schedule in threshold order, up to the tracked horizon.
pub fn milestones() -> impl Iterator<Item = Milestone> {
    (0..)
        .map(Milestone::nth)
        .take_while(|m| m.threshold_months <= MAX_TRACKED_MONTHS)
}

/// Cumulative scheduled payout for a hire that has completed `months`.
pub fn scheduled_points(months: i32) -> i32 {
    if months < FIRST_MILESTONE_MONTHS {
        0
    } else {
        FIRST_MILESTONE_POINTS + RECURRING_MILESTONE_POINTS * (months / RECURRING_INTERVAL_MONTHS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextMilestone {
    pub threshold_months: i32,
    pub points: i32,
    pub months_remaining: i32,
}

pub fn next_milestone(months: i32) -> NextMilestone {
    let upcoming = if months < FIRST_MILESTONE_MONTHS {
        Milestone::nth(0)
    } else {
        Milestone::nth(months / RECURRING_INTERVAL_MONTHS + 1)
    };

    NextMilestone {
        threshold_months: upcoming.threshold_months,
        points: upcoming.points,
        months_remaining: upcoming.threshold_months - months,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccrualOutcome {
    /// Points to credit now.
    pub payable_delta: i32,
    /// `points_earned` after the delta is applied.
    pub points_earned: i32,
    pub scheduled_points: i32,
    /// Milestones crossed whose payout is not yet fully covered.
    pub payable_milestones: Vec<Milestone>,
    pub next_milestone: Option<NextMilestone>,
}

impl AccrualOutcome {
    fn nothing_owed(points_earned: i32) -> Self {
        AccrualOutcome {
            payable_delta: 0,
            points_earned,
            scheduled_points: 0,
            payable_milestones: Vec::new(),
            next_milestone: None,
        }
    }

    pub fn is_overpaid(&self) -> bool {
        self.next_milestone.is_some() && self.points_earned > self.scheduled_points
    }
}

fn validate(months_completed: i32, points_earned: i32) -> Result<(), AccrualError> {
    if months_completed < 0 {
        return Err(AccrualError::InvalidInput(format!(
            "months completed cannot be negative (got {})",
            months_completed
        )));
    }
    if months_completed > MAX_TRACKED_MONTHS {
        return Err(AccrualError::InvalidInput(format!(
            "months completed exceeds {} (got {})",
            MAX_TRACKED_MONTHS, months_completed
        )));
    }
    if points_earned < 0 {
        return Err(AccrualError::InvalidInput(format!(
            "points earned cannot be negative (got {})",
            points_earned
        )));
    }
    Ok(())
}

pub fn calculate_accrual(
    status: ReferralStatus,
    months_completed: i32,
    points_earned: i32,
) -> Result<AccrualOutcome, AccrualError> {
    validate(months_completed, points_earned)?;

    if status != ReferralStatus::Hired {
        return Ok(AccrualOutcome::nothing_owed(points_earned));
    }

    let mut cumulative = 0;
    let mut payable_milestones = Vec::new();
    for milestone in milestones().take_while(|m| m.threshold_months <= months_completed) {
        cumulative += milestone.points;
        if cumulative > points_earned {
            payable_milestones.push(milestone);
        }
    }

    let scheduled = scheduled_points(months_completed);
    debug_assert_eq!(cumulative, scheduled);
    let payable_delta = (scheduled - points_earned).max(0);

    Ok(AccrualOutcome {
        payable_delta,
        points_earned: points_earned + payable_delta,
        scheduled_points: scheduled,
        payable_milestones,
        next_milestone: Some(next_milestone(months_completed)),
    })
}

/// Same as [`calculate_accrual`] for loosely typed callers.
pub fn calculate_accrual_from_raw(
    status: &str,
    months_completed: i64,
    points_earned: i64,
) -> Result<AccrualOutcome, AccrualError> {
    let status: ReferralStatus = status.parse()?;
    let months = i32::try_from(months_completed).map_err(|_| {
        AccrualError::InvalidInput(format!("months completed out of range (got {})", months_completed))
    })?;
    let points = i32::try_from(points_earned).map_err(|_| {
        AccrualError::InvalidInput(format!("points earned out of range (got {})", points_earned))
    })?;
    calculate_accrual(status, months, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hired(months: i32, paid: i32) -> AccrualOutcome {
        calculate_accrual(ReferralStatus::Hired, months, paid).unwrap()
    }

    #[test]
    fn test_non_hired_never_accrues() {
        for status in [ReferralStatus::Applied, ReferralStatus::Interview, ReferralStatus::Rejected] {
            for months in [0, 3, 6, 24, 120] {
                let outcome = calculate_accrual(status, months, 0).unwrap();
                assert_eq!(outcome.payable_delta, 0);
                assert_eq!(outcome.next_milestone, None);
                assert!(outcome.payable_milestones.is_empty());
            }
        }
    }

    #[test]
    fn test_three_months_pays_first_bonus() {
        let outcome = hired(3, 0);
        assert_eq!(outcome.payable_delta, 3);
        assert_eq!(outcome.points_earned, 3);
        assert_eq!(
            outcome.next_milestone,
            Some(NextMilestone { threshold_months: 6, points: 2, months_remaining: 3 })
        );
        assert_eq!(outcome.payable_milestones, vec![Milestone { threshold_months: 3, points: 3 }]);
    }

    #[test]
    fn test_six_months_after_first_bonus() {
        let outcome = hired(6, 3);
        assert_eq!(outcome.payable_delta, 2);
        assert_eq!(outcome.points_earned, 5);
    }

    #[test]
    fn test_between_milestones_owes_nothing() {
        let outcome = hired(11, 5);
        assert_eq!(outcome.payable_delta, 0);
        assert!(outcome.payable_milestones.is_empty());
        assert_eq!(
            outcome.next_milestone,
            Some(NextMilestone { threshold_months: 12, points: 2, months_remaining: 1 })
        );
    }

    #[test]
    fn test_catch_up_pays_every_crossed_milestone() {
        let outcome = hired(24, 0);
        assert_eq!(outcome.payable_delta, 11);
        let thresholds: Vec<i32> = outcome.payable_milestones.iter().map(|m| m.threshold_months).collect();
        assert_eq!(thresholds, vec![3, 6, 12, 18, 24]);
        assert_eq!(outcome.next_milestone.unwrap().threshold_months, 30);
    }

    #[test]
    fn test_before_first_milestone() {
        let outcome = hired(0, 0);
        assert_eq!(outcome.payable_delta, 0);
        assert_eq!(
            outcome.next_milestone,
            Some(NextMilestone { threshold_months: 3, points: 3, months_remaining: 3 })
        );
        assert_eq!(hired(2, 0).next_milestone.unwrap().months_remaining, 1);
    }

    #[test]
    fn test_repeated_calls_are_idempotent() {
        let first = hired(18, 5);
        let second = hired(18, 5);
        assert_eq!(first, second);
        assert_eq!(first.payable_delta, 4);

        // Once the caller applies the delta, nothing more is owed.
        assert_eq!(hired(18, first.points_earned).payable_delta, 0);
    }

    #[test]
    fn test_overpaid_referral_is_clamped() {
        let outcome = hired(6, 9);
        assert_eq!(outcome.payable_delta, 0);
        assert_eq!(outcome.points_earned, 9);
        assert!(outcome.is_overpaid());
    }

    #[test]
    fn test_partial_payment_keeps_milestone_payable() {
        let outcome = hired(6, 4);
        assert_eq!(outcome.payable_delta, 1);
        assert_eq!(outcome.payable_milestones, vec![Milestone { threshold_months: 6, points: 2 }]);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        assert!(matches!(
            calculate_accrual(ReferralStatus::Hired, -1, 0),
            Err(AccrualError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_accrual(ReferralStatus::Applied, -4, 0),
            Err(AccrualError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_accrual(ReferralStatus::Hired, 6, -2),
            Err(AccrualError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_accrual(ReferralStatus::Hired, MAX_TRACKED_MONTHS + 1, 0),
            Err(AccrualError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_accrual_from_raw("Promoted", 6, 0),
            Err(AccrualError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate_accrual_from_raw("Hired", i64::from(i32::MAX) + 1, 0),
            Err(AccrualError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_schedule_matches_closed_form() {
        for months in 0..=120 {
            let walked: i32 = milestones()
                .take_while(|m| m.threshold_months <= months)
                .map(|m| m.points)
                .sum();
            assert_eq!(walked, scheduled_points(months), "months = {}", months);
        }
        assert_eq!(hired(MAX_TRACKED_MONTHS, 0).payable_delta, 3 + 2 * 200);
    }
}
