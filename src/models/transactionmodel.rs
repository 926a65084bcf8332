use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Referral,
    Performance,
    Travel,
    Redemption,
    Deduction,
}

impl TransactionType {
    pub fn to_str(&self) -> &str {
        match self {
            TransactionType::Referral => "referral",
            TransactionType::Performance => "performance",
            TransactionType::Travel => "travel",
            TransactionType::Redemption => "redemption",
            TransactionType::Deduction => "deduction",
        }
    }

    /// Types an admin may credit by hand.
    pub fn is_earning(&self) -> bool {
        matches!(
            self,
            TransactionType::Referral | TransactionType::Performance | TransactionType::Travel
        )
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "referral" => Ok(TransactionType::Referral),
            "performance" => Ok(TransactionType::Performance),
            "travel" => Ok(TransactionType::Travel),
            "redemption" => Ok(TransactionType::Redemption),
            "deduction" => Ok(TransactionType::Deduction),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

/// Which workflow produced a ledger entry.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "transaction_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    Manual,
    ReferralMilestone,
    FairUsePenalty,
    Nomination,
    Redemption,
}

impl TransactionSource {
    pub fn to_str(&self) -> &str {
        match self {
            TransactionSource::Manual => "manual",
            TransactionSource::ReferralMilestone => "referral_milestone",
            TransactionSource::FairUsePenalty => "fair_use_penalty",
            TransactionSource::Nomination => "nomination",
            TransactionSource::Redemption => "redemption",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: TransactionType,
    /// Signed: credits are positive, redemptions and deductions negative.
    pub amount: i32,
    pub description: String,
    pub source: TransactionSource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,

    pub status: TransactionStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn approved(
        user_id: Uuid,
        kind: TransactionType,
        amount: i32,
        description: impl Into<String>,
        source: TransactionSource,
    ) -> Self {
        Transaction {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            description: description.into(),
            source,
            referral_id: None,
            reference_number: None,
            status: TransactionStatus::Approved,
            approved_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn counts(&self) -> bool {
        self.status == TransactionStatus::Approved
    }
}
