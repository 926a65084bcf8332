// service/fair_use.rs
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::transactionmodel::TransactionType;

/// Where a fair-use deduction lands. The programme rules do not say, so
/// deployments choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyTarget {
    /// Recorded as a `deduction` and taken from the overall balance.
    TotalBalance,
    /// Recorded as a negative `referral` entry, reducing referral points only.
    ReferralPoints,
}

impl PenaltyTarget {
    pub fn ledger_type(&self) -> TransactionType {
        match self {
            PenaltyTarget::TotalBalance => TransactionType::Deduction,
            PenaltyTarget::ReferralPoints => TransactionType::Referral,
        }
    }
}

impl fmt::Display for PenaltyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PenaltyTarget::TotalBalance => f.write_str("total"),
            PenaltyTarget::ReferralPoints => f.write_str("referral"),
        }
    }
}

impl FromStr for PenaltyTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "total" | "total_balance" => Ok(PenaltyTarget::TotalBalance),
            "referral" | "referral_points" => Ok(PenaltyTarget::ReferralPoints),
            other => Err(format!("unknown penalty target '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FairUsePolicy {
    /// Rejected referrals per point of penalty.
    pub rejection_block: i32,
    pub max_referrals_per_month: usize,
    pub penalty_target: PenaltyTarget,
}

impl Default for FairUsePolicy {
    fn default() -> Self {
        FairUsePolicy {
            rejection_block: 10,
            max_referrals_per_month: 5,
            penalty_target: PenaltyTarget::TotalBalance,
        }
    }
}

impl FairUsePolicy {
    /// Total penalty a referrer has earned for `rejected` referrals.
    pub fn penalty_owed(&self, rejected: i64) -> i32 {
        if rejected <= 0 || self.rejection_block <= 0 {
            return 0;
        }
        (rejected / self.rejection_block as i64) as i32
    }

    /// Penalty still to deduct given what has already been applied.
    pub fn outstanding_penalty(&self, rejected: i64, already_applied: i32) -> i32 {
        (self.penalty_owed(rejected) - already_applied.max(0)).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_per_block_of_rejections() {
        let policy = FairUsePolicy::default();
        assert_eq!(policy.penalty_owed(0), 0);
        assert_eq!(policy.penalty_owed(9), 0);
        assert_eq!(policy.penalty_owed(10), 1);
        assert_eq!(policy.penalty_owed(19), 1);
        assert_eq!(policy.penalty_owed(25), 2);
    }

    #[test]
    fn test_outstanding_penalty_is_idempotent() {
        let policy = FairUsePolicy::default();
        assert_eq!(policy.outstanding_penalty(25, 0), 2);
        assert_eq!(policy.outstanding_penalty(25, 2), 0);
        assert_eq!(policy.outstanding_penalty(25, 5), 0);
        assert_eq!(policy.outstanding_penalty(30, 2), 1);
    }

    #[test]
    fn test_penalty_target_parsing() {
        assert_eq!("total".parse::<PenaltyTarget>().unwrap(), PenaltyTarget::TotalBalance);
        assert_eq!("Referral".parse::<PenaltyTarget>().unwrap(), PenaltyTarget::ReferralPoints);
        assert!("wallet".parse::<PenaltyTarget>().is_err());
        assert_eq!(PenaltyTarget::ReferralPoints.ledger_type(), TransactionType::Referral);
    }
}
