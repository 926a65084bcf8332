use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        rewardmodel::{Redemption, RedemptionStatus},
        status::{HasBadge, StatusBadge},
    },
    service::reward_service::{CatalogueFilter, PointsRange},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogueQueryDto {
    pub search: Option<String>,
    pub category: Option<String>,
    pub range: Option<PointsRange>,
    pub user_id: Option<Uuid>,
}

impl CatalogueQueryDto {
    pub fn filter(&self) -> CatalogueFilter {
        CatalogueFilter {
            search: self.search.clone(),
            category: self.category.clone(),
            range: self.range,
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRewardDto {
    pub user_id: Uuid,
    pub reward_id: Uuid,

    #[validate(length(min = 5, max = 500, message = "Delivery address must be between 5 and 500 characters"))]
    pub delivery_address: Option<String>,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRedemptionStatusDto {
    pub admin_id: Uuid,
    pub status: RedemptionStatus,

    #[validate(length(min = 1, max = 64, message = "Tracking number must be between 1 and 64 characters"))]
    pub tracking_number: Option<String>,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedemptionQueryDto {
    pub user_id: Option<Uuid>,
    pub status: Option<RedemptionStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionView {
    #[serde(flatten)]
    pub redemption: Redemption,
    pub badge: StatusBadge,
}

impl RedemptionView {
    pub fn from_redemption(redemption: Redemption) -> Self {
        RedemptionView {
            badge: redemption.status.badge(),
            redemption,
        }
    }

    pub fn from_redemptions(redemptions: Vec<Redemption>) -> Vec<RedemptionView> {
        redemptions
            .into_iter()
            .map(RedemptionView::from_redemption)
            .collect()
    }
}
