use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct RewardItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub points_cost: i32,
    pub category: String,
    pub image: String,
    pub available: bool,

    /// Monetary ceiling of the reward, in rupees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "redemption_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
    Delivered,
}

impl RedemptionStatus {
    pub fn to_str(&self) -> &str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Approved => "approved",
            RedemptionStatus::Rejected => "rejected",
            RedemptionStatus::Delivered => "delivered",
        }
    }

    pub fn can_transition_to(&self, next: RedemptionStatus) -> bool {
        matches!(
            (self, next),
            (RedemptionStatus::Pending, RedemptionStatus::Approved)
                | (RedemptionStatus::Pending, RedemptionStatus::Rejected)
                | (RedemptionStatus::Approved, RedemptionStatus::Delivered)
        )
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Redemption {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reward_id: Uuid,
    pub item_name: String,
    pub points_used: i32,
    pub date_submitted: DateTime<Utc>,
    pub status: RedemptionStatus,
    pub transaction_id: Uuid,
    pub reference_number: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redemption_lifecycle() {
        use RedemptionStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Delivered.can_transition_to(Rejected));
    }
}
