use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        status::{HasBadge, StatusBadge},
        transactionmodel::{Transaction, TransactionStatus, TransactionType},
    },
    service::audit_service::{AuditFilter, AuditPeriod},
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct AwardPointsDto {
    pub admin_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,

    #[validate(range(min = 1, max = 1000, message = "Amount must be between 1 and 1000"))]
    pub amount: i32,

    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct DeductPointsDto {
    pub admin_id: Uuid,
    pub user_id: Uuid,

    #[validate(range(min = 1, message = "Amount must be at least 1"))]
    pub amount: i32,

    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseTransactionDto {
    pub admin_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionQueryDto {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditQueryDto {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub period: Option<AuditPeriod>,
}

impl From<AuditQueryDto> for AuditFilter {
    fn from(query: AuditQueryDto) -> Self {
        AuditFilter {
            search: query.search,
            kind: query.kind,
            period: query.period.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub badge: StatusBadge,
}

impl TransactionView {
    pub fn from_transaction(transaction: Transaction) -> Self {
        TransactionView {
            badge: transaction.status.badge(),
            transaction,
        }
    }

    pub fn from_transactions(transactions: Vec<Transaction>) -> Vec<TransactionView> {
        transactions
            .into_iter()
            .map(TransactionView::from_transaction)
            .collect()
    }
}
