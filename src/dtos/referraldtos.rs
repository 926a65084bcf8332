use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        referralmodel::{Referral, ReferralStatus},
        status::{HasBadge, StatusBadge},
    },
    service::{accrual::AccrualOutcome, referral_service::NewReferral},
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReferralDto {
    pub referrer_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Candidate name is required"))]
    pub candidate_name: String,

    #[validate(
        length(min = 1, message = "Candidate email is required"),
        email(message = "Candidate email is invalid")
    )]
    pub candidate_email: String,

    #[validate(length(min = 7, max = 20, message = "Phone number must be between 7 and 20 characters"))]
    pub candidate_phone: String,

    #[validate(length(min = 1, message = "Position is required"))]
    pub position: String,

    #[validate(length(min = 1, message = "Relationship is required"))]
    pub relationship: String,

    #[validate(range(min = 0, max = 80, message = "Years known must be between 0 and 80"))]
    #[serde(default)]
    pub years_known: i32,
}

impl From<SubmitReferralDto> for NewReferral {
    fn from(dto: SubmitReferralDto) -> Self {
        NewReferral {
            referrer_id: dto.referrer_id,
            candidate_name: dto.candidate_name,
            candidate_email: dto.candidate_email,
            candidate_phone: dto.candidate_phone,
            position: dto.position,
            relationship: dto.relationship,
            years_known: dto.years_known,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReferralStatusDto {
    pub status: ReferralStatus,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RecordTenureDto {
    #[validate(range(min = 0, max = 1200, message = "Months completed must be between 0 and 1200"))]
    pub months_completed: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferralQueryDto {
    pub referrer_id: Option<Uuid>,
    pub status: Option<ReferralStatus>,
}

/// Calculator input for what-if previews. Loosely typed on purpose so bad
/// input surfaces as a validation error rather than a rejected body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualPreviewDto {
    pub status: String,
    pub months_completed: i64,
    pub points_earned: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralView {
    #[serde(flatten)]
    pub referral: Referral,
    pub badge: StatusBadge,
}

impl ReferralView {
    pub fn from_referral(referral: Referral) -> Self {
        ReferralView {
            badge: referral.status.badge(),
            referral,
        }
    }

    pub fn from_referrals(referrals: Vec<Referral>) -> Vec<ReferralView> {
        referrals.into_iter().map(ReferralView::from_referral).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralDetailDto {
    pub referral: ReferralView,
    pub link: String,
    pub accrual: AccrualOutcome,
}
