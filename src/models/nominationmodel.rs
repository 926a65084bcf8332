use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "nomination_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NominationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Nomination {
    pub id: Uuid,
    pub nominator_id: Uuid,
    pub employee_id: Uuid,
    pub points: i32,
    pub reason: String,
    pub date_submitted: DateTime<Utc>,
    pub status: NominationStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<DateTime<Utc>>,
}
