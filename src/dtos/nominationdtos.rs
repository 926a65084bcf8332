use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    nominationmodel::{Nomination, NominationStatus},
    status::{HasBadge, StatusBadge},
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct NominateDto {
    pub nominator_id: Uuid,
    pub employee_id: Uuid,

    #[validate(range(min = 1, max = 100, message = "Points must be between 1 and 100"))]
    pub points: i32,

    #[validate(length(min = 1, max = 1000, message = "Reason is required"))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominationDecisionDto {
    pub admin_id: Uuid,
    pub approve: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NominationQueryDto {
    pub nominator_id: Option<Uuid>,
    pub status: Option<NominationStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NominationView {
    #[serde(flatten)]
    pub nomination: Nomination,
    pub badge: StatusBadge,
}

impl NominationView {
    pub fn from_nomination(nomination: Nomination) -> Self {
        NominationView {
            badge: nomination.status.badge(),
            nomination,
        }
    }

    pub fn from_nominations(nominations: Vec<Nomination>) -> Vec<NominationView> {
        nominations
            .into_iter()
            .map(NominationView::from_nomination)
            .collect()
    }
}
