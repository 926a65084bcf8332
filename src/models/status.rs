//! Display badges for every status enum in the portal.
//!
//! All screens resolve a status to an icon and colour through this table
//! instead of keeping their own switch statements.

use serde::Serialize;

use super::{
    nominationmodel::NominationStatus, referralmodel::ReferralStatus,
    rewardmodel::RedemptionStatus, transactionmodel::TransactionStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub icon: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Success,
    InProgress,
    Waiting,
    Failure,
    Shipped,
}

impl BadgeTone {
    pub const fn badge(self) -> StatusBadge {
        match self {
            BadgeTone::Success => StatusBadge { icon: "check-circle", color: "green" },
            BadgeTone::InProgress => StatusBadge { icon: "clock", color: "blue" },
            BadgeTone::Waiting => StatusBadge { icon: "alert-circle", color: "yellow" },
            BadgeTone::Failure => StatusBadge { icon: "x-circle", color: "red" },
            BadgeTone::Shipped => StatusBadge { icon: "truck", color: "purple" },
        }
    }
}

pub trait HasBadge {
    fn tone(&self) -> BadgeTone;

    fn badge(&self) -> StatusBadge {
        self.tone().badge()
    }
}

impl HasBadge for ReferralStatus {
    fn tone(&self) -> BadgeTone {
        match self {
            ReferralStatus::Applied => BadgeTone::Waiting,
            ReferralStatus::Interview => BadgeTone::InProgress,
            ReferralStatus::Hired => BadgeTone::Success,
            ReferralStatus::Rejected => BadgeTone::Failure,
        }
    }
}

impl HasBadge for TransactionStatus {
    fn tone(&self) -> BadgeTone {
        match self {
            TransactionStatus::Pending => BadgeTone::Waiting,
            TransactionStatus::Approved => BadgeTone::Success,
            TransactionStatus::Rejected => BadgeTone::Failure,
        }
    }
}

impl HasBadge for RedemptionStatus {
    fn tone(&self) -> BadgeTone {
        match self {
            RedemptionStatus::Pending => BadgeTone::Waiting,
            RedemptionStatus::Approved => BadgeTone::Success,
            RedemptionStatus::Rejected => BadgeTone::Failure,
            RedemptionStatus::Delivered => BadgeTone::Shipped,
        }
    }
}

impl HasBadge for NominationStatus {
    fn tone(&self) -> BadgeTone {
        match self {
            NominationStatus::Pending => BadgeTone::Waiting,
            NominationStatus::Approved => BadgeTone::Success,
            NominationStatus::Rejected => BadgeTone::Failure,
        }
    }
}
