use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::accrual::AccrualError;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "referral_status", rename_all = "snake_case")]
pub enum ReferralStatus {
    Applied,
    Interview,
    Hired,
    Rejected,
}

impl ReferralStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ReferralStatus::Applied => "Applied",
            ReferralStatus::Interview => "Interview",
            ReferralStatus::Hired => "Hired",
            ReferralStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReferralStatus::Hired | ReferralStatus::Rejected)
    }

    /// Applied -> Interview -> Hired, or Rejected from any non-terminal state.
    pub fn can_transition_to(&self, next: ReferralStatus) -> bool {
        matches!(
            (self, next),
            (ReferralStatus::Applied, ReferralStatus::Interview)
                | (ReferralStatus::Applied, ReferralStatus::Rejected)
                | (ReferralStatus::Interview, ReferralStatus::Hired)
                | (ReferralStatus::Interview, ReferralStatus::Rejected)
        )
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = AccrualError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "applied" => Ok(ReferralStatus::Applied),
            "interview" => Ok(ReferralStatus::Interview),
            "hired" => Ok(ReferralStatus::Hired),
            "rejected" => Ok(ReferralStatus::Rejected),
            _ => Err(AccrualError::InvalidInput(format!(
                "unrecognized referral status '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_phone: String,
    pub position: String,
    pub relationship: String,
    pub years_known: i32,
    pub date_submitted: DateTime<Utc>,
    pub status: ReferralStatus,
    pub points_earned: i32,
    pub months_completed: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hired_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReferralStats {
    pub total_referrals: i64,
    pub active_referrals: i64,
    pub hired_referrals: i64,
    pub rejected_referrals: i64,
    pub total_points_earned: i64,
}

impl ReferralStats {
    pub fn from_referrals(referrals: &[Referral]) -> Self {
        referrals.iter().fold(ReferralStats::default(), |mut stats, referral| {
            stats.total_referrals += 1;
            stats.total_points_earned += referral.points_earned as i64;
            match referral.status {
                ReferralStatus::Applied | ReferralStatus::Interview => stats.active_referrals += 1,
                ReferralStatus::Hired => stats.hired_referrals += 1,
                ReferralStatus::Rejected => stats.rejected_referrals += 1,
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_machine() {
        use ReferralStatus::*;
        assert!(Applied.can_transition_to(Interview));
        assert!(Applied.can_transition_to(Rejected));
        assert!(Interview.can_transition_to(Hired));
        assert!(Interview.can_transition_to(Rejected));

        assert!(!Applied.can_transition_to(Hired));
        assert!(!Applied.can_transition_to(Applied));
        assert!(!Interview.can_transition_to(Applied));
        for next in [Applied, Interview, Hired, Rejected] {
            assert!(!Hired.can_transition_to(next));
            assert!(!Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Hired".parse::<ReferralStatus>().unwrap(), ReferralStatus::Hired);
        assert_eq!(" interview ".parse::<ReferralStatus>().unwrap(), ReferralStatus::Interview);
        assert!(matches!(
            "Onboarding".parse::<ReferralStatus>(),
            Err(AccrualError::InvalidInput(_))
        ));
    }
}
