// service/reward_service.rs
use std::{collections::BTreeSet, str::FromStr, sync::Arc};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{LedgerExt, PortalStore, RewardExt, UserExt},
    models::{
        rewardmodel::{Redemption, RedemptionStatus, RewardItem},
        transactionmodel::{Transaction, TransactionSource, TransactionType},
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        ledger::PointBalances,
        reference::{generate_reference_number, REDEMPTION_PREFIX},
    },
};

/// Catalogue price bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsRange {
    Low,
    Medium,
    High,
}

impl PointsRange {
    pub fn contains(&self, cost: i32) -> bool {
        match self {
            PointsRange::Low => cost <= 10,
            PointsRange::Medium => (11..=30).contains(&cost),
            PointsRange::High => cost > 30,
        }
    }
}

impl FromStr for PointsRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(PointsRange::Low),
            "medium" => Ok(PointsRange::Medium),
            "high" => Ok(PointsRange::High),
            other => Err(format!("unknown points range '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogueFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub range: Option<PointsRange>,
}

impl CatalogueFilter {
    pub fn matches(&self, reward: &RewardItem) -> bool {
        if !reward.available {
            return false;
        }

        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                reward.name.to_lowercase().contains(&needle)
                    || reward.description.to_lowercase().contains(&needle)
            }
            _ => true,
        };

        let category_ok = match self.category.as_deref() {
            Some(category) if !category.is_empty() && !category.eq_ignore_ascii_case("all") => {
                reward.category.eq_ignore_ascii_case(category)
            }
            _ => true,
        };

        let range_ok = self.range.map_or(true, |r| r.contains(reward.points_cost));

        search_ok && category_ok && range_ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogueEntry {
    #[serde(flatten)]
    pub reward: RewardItem,
    /// Present when the listing was requested for a specific user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affordable: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct RedemptionRequest {
    pub user_id: Uuid,
    pub reward_id: Uuid,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RewardService {
    db_client: Arc<dyn PortalStore>,
}

impl RewardService {
    pub fn new(db_client: Arc<dyn PortalStore>) -> Self {
        Self { db_client }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    async fn balances_of(&self, user_id: Uuid) -> Result<PointBalances, ServiceError> {
        let ledger = self.db_client.get_transactions(Some(user_id)).await?;
        Ok(PointBalances::from_transactions(&ledger))
    }

    pub async fn catalogue(
        &self,
        filter: &CatalogueFilter,
        for_user: Option<Uuid>,
    ) -> Result<Vec<CatalogueEntry>, ServiceError> {
        let balance = match for_user {
            Some(user_id) => {
                self.require_user(user_id).await?;
                Some(self.balances_of(user_id).await?.total_points)
            }
            None => None,
        };

        Ok(self
            .db_client
            .get_rewards()
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .map(|reward| CatalogueEntry {
                affordable: balance.map(|total| total >= reward.points_cost),
                reward,
            })
            .collect())
    }

    pub async fn categories(&self) -> Result<Vec<String>, ServiceError> {
        let categories: BTreeSet<String> = self
            .db_client
            .get_rewards()
            .await?
            .into_iter()
            .filter(|r| r.available)
            .map(|r| r.category)
            .collect();
        Ok(categories.into_iter().collect())
    }

    pub async fn list_redemptions(
        &self,
        user_id: Option<Uuid>,
        status: Option<RedemptionStatus>,
    ) -> Result<Vec<Redemption>, ServiceError> {
        Ok(self.db_client.get_redemptions(user_id, status).await?)
    }

    /// Debits the cost up front and files a pending redemption.
    pub async fn redeem(&self, request: RedemptionRequest) -> Result<Redemption, ServiceError> {
        self.require_user(request.user_id).await?;

        let reward = self
            .db_client
            .get_reward(request.reward_id)
            .await?
            .ok_or(ServiceError::RewardNotFound(request.reward_id))?;

        if !reward.available {
            return Err(ServiceError::Validation(format!(
                "{} is not available for redemption",
                reward.name
            )));
        }

        let balances = self.balances_of(request.user_id).await?;
        if !balances.can_afford(reward.points_cost) {
            return Err(ServiceError::InsufficientPoints {
                required: reward.points_cost,
                available: balances.total_points,
            });
        }

        let reference_number = generate_reference_number(REDEMPTION_PREFIX);

        let mut debit = Transaction::approved(
            request.user_id,
            TransactionType::Redemption,
            -reward.points_cost,
            format!("Redeemed: {}", reward.name),
            TransactionSource::Redemption,
        );
        debit.reference_number = Some(reference_number.clone());

        let redemption = Redemption {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            reward_id: reward.id,
            item_name: reward.name.clone(),
            points_used: reward.points_cost,
            date_submitted: Utc::now(),
            status: RedemptionStatus::Pending,
            transaction_id: debit.id,
            reference_number,
            delivery_address: request.delivery_address,
            tracking_number: None,
            notes: request.notes,
        };

        let redemption = match self.db_client.create_redemption(&redemption, &debit).await? {
            Some(redemption) => redemption,
            None => {
                let balances = self.balances_of(request.user_id).await?;
                return Err(ServiceError::InsufficientPoints {
                    required: reward.points_cost,
                    available: balances.total_points,
                });
            }
        };
        tracing::info!(
            "Redemption {} filed by {} for {} ({} points)",
            redemption.reference_number,
            redemption.user_id,
            redemption.item_name,
            redemption.points_used
        );
        Ok(redemption)
    }

    /// Admin lifecycle step. Rejection refunds the debit.
    pub async fn update_status(
        &self,
        admin_id: Uuid,
        redemption_id: Uuid,
        next: RedemptionStatus,
        tracking_number: Option<String>,
        notes: Option<String>,
    ) -> Result<Redemption, ServiceError> {
        let admin = self.require_user(admin_id).await?;
        if admin.role != UserRole::Admin {
            return Err(ServiceError::Forbidden(
                admin_id,
                "update redemptions".to_string(),
            ));
        }

        let mut redemption = self
            .db_client
            .get_redemption(redemption_id)
            .await?
            .ok_or(ServiceError::RedemptionNotFound(redemption_id))?;

        if !redemption.status.can_transition_to(next) {
            return Err(ServiceError::InvalidRedemptionTransition(
                redemption_id,
                redemption.status,
                next,
            ));
        }

        let previous = redemption.status;
        redemption.status = next;
        if next == RedemptionStatus::Delivered && tracking_number.is_some() {
            redemption.tracking_number = tracking_number;
        }
        if notes.is_some() {
            redemption.notes = notes;
        }

        let refund = next == RedemptionStatus::Rejected;
        let updated = self
            .db_client
            .update_redemption(&redemption, previous, refund)
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(redemption_id))?;

        if refund {
            tracing::info!(
                "Redemption {} rejected, {} points refunded to {}",
                updated.reference_number,
                updated.points_used,
                updated.user_id
            );
        } else {
            tracing::info!("Redemption {} is now {}", updated.reference_number, next.to_str());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed, MemoryDb};

    async fn setup() -> (Arc<MemoryDb>, RewardService) {
        let db = Arc::new(MemoryDb::new());
        seed::seed_demo_data(db.as_ref()).await.unwrap();
        let service = RewardService::new(db.clone());
        (db, service)
    }

    fn request(user_id: Uuid, reward_id: Uuid) -> RedemptionRequest {
        RedemptionRequest {
            user_id,
            reward_id,
            delivery_address: Some("12 Residency Rd, Bengaluru".to_string()),
            notes: None,
        }
    }

    const TRIP: Uuid = Uuid::from_u128(0x101);
    const GYM: Uuid = Uuid::from_u128(0x104);
    const SPA: Uuid = Uuid::from_u128(0x109);

    #[test]
    fn test_points_ranges() {
        assert!(PointsRange::Low.contains(10));
        assert!(!PointsRange::Low.contains(11));
        assert!(PointsRange::Medium.contains(11));
        assert!(PointsRange::Medium.contains(30));
        assert!(PointsRange::High.contains(31));
        assert_eq!("HIGH".parse::<PointsRange>().unwrap(), PointsRange::High);
        assert!("cheap".parse::<PointsRange>().is_err());
    }

    #[tokio::test]
    async fn test_catalogue_filters() {
        let (_, service) = setup().await;

        let travel = service
            .catalogue(
                &CatalogueFilter {
                    category: Some("travel".to_string()),
                    ..CatalogueFilter::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(travel.len(), 2);
        assert!(travel.iter().all(|e| e.affordable.is_none()));

        let medium = service
            .catalogue(
                &CatalogueFilter {
                    range: Some(PointsRange::Medium),
                    ..CatalogueFilter::default()
                },
                None,
            )
            .await
            .unwrap();
        let costs: Vec<i32> = medium.iter().map(|e| e.reward.points_cost).collect();
        assert_eq!(costs, vec![30, 20, 12]);

        let search = service
            .catalogue(
                &CatalogueFilter {
                    search: Some("VOUCHER".to_string()),
                    ..CatalogueFilter::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(search.len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_rewards_are_hidden() {
        let (db, service) = setup().await;
        let mut spa = db.get_reward(SPA).await.unwrap().unwrap();
        spa.available = false;
        db.save_reward(&spa).await.unwrap();

        let all = service.catalogue(&CatalogueFilter::default(), None).await.unwrap();
        assert_eq!(all.len(), 8);
        assert!(!service.categories().await.unwrap().contains(&"Wellness".to_string()));

        let result = service.redeem(request(seed::JOHN_ID, SPA)).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_affordability_for_user() {
        let (_, service) = setup().await;
        let entries = service
            .catalogue(&CatalogueFilter::default(), Some(seed::JOHN_ID))
            .await
            .unwrap();
        let trip = entries.iter().find(|e| e.reward.id == TRIP).unwrap();
        let gym = entries.iter().find(|e| e.reward.id == GYM).unwrap();
        assert_eq!(trip.affordable, Some(false));
        assert_eq!(gym.affordable, Some(true));
    }

    #[tokio::test]
    async fn test_redeem_debits_and_reject_refunds() {
        let (_, service) = setup().await;
        let before = service.balances_of(seed::JOHN_ID).await.unwrap();

        let redemption = service.redeem(request(seed::JOHN_ID, GYM)).await.unwrap();
        assert_eq!(redemption.status, RedemptionStatus::Pending);
        assert!(redemption.reference_number.starts_with("RDM-"));

        let debited = service.balances_of(seed::JOHN_ID).await.unwrap();
        assert_eq!(debited.total_points, before.total_points - 20);
        assert_eq!(debited.redemptions, before.redemptions + 20);

        service
            .update_status(seed::ADMIN_ID, redemption.id, RedemptionStatus::Rejected, None, Some("Out of stock".to_string()))
            .await
            .unwrap();
        let refunded = service.balances_of(seed::JOHN_ID).await.unwrap();
        assert_eq!(refunded, before);
    }

    #[tokio::test]
    async fn test_refund_applies_once() {
        let (db, service) = setup().await;
        let redemption = service.redeem(request(seed::JOHN_ID, GYM)).await.unwrap();
        let stale = db.get_redemption(redemption.id).await.unwrap().unwrap();

        service
            .update_status(seed::ADMIN_ID, redemption.id, RedemptionStatus::Rejected, None, None)
            .await
            .unwrap();
        let refunded = service.balances_of(seed::JOHN_ID).await.unwrap();

        let mut late = stale;
        late.status = RedemptionStatus::Rejected;
        let replay = db
            .update_redemption(&late, RedemptionStatus::Pending, true)
            .await
            .unwrap();
        assert!(replay.is_none());
        assert_eq!(service.balances_of(seed::JOHN_ID).await.unwrap(), refunded);
    }

    #[tokio::test]
    async fn test_second_redemption_cannot_overdraw() {
        let (_, service) = setup().await;
        // 35 points covers one gym membership (20) but not two.
        service.redeem(request(seed::JOHN_ID, GYM)).await.unwrap();
        let second = service.redeem(request(seed::JOHN_ID, GYM)).await;
        assert!(matches!(
            second,
            Err(ServiceError::InsufficientPoints { required: 20, available: 15 })
        ));
    }

    #[tokio::test]
    async fn test_redeem_requires_enough_points() {
        let (_, service) = setup().await;
        let result = service.redeem(request(seed::JOHN_ID, TRIP)).await;
        assert!(matches!(
            result,
            Err(ServiceError::InsufficientPoints { required: 50, available: 35 })
        ));
    }

    #[tokio::test]
    async fn test_lifecycle_through_delivery() {
        let (_, service) = setup().await;
        let redemption = service.redeem(request(seed::BOB_ID, SPA)).await.unwrap();

        let early = service
            .update_status(seed::ADMIN_ID, redemption.id, RedemptionStatus::Delivered, None, None)
            .await;
        assert!(matches!(early, Err(ServiceError::InvalidRedemptionTransition(..))));

        let forbidden = service
            .update_status(seed::BOB_ID, redemption.id, RedemptionStatus::Approved, None, None)
            .await;
        assert!(matches!(forbidden, Err(ServiceError::Forbidden(..))));

        service
            .update_status(seed::ADMIN_ID, redemption.id, RedemptionStatus::Approved, None, None)
            .await
            .unwrap();
        let delivered = service
            .update_status(
                seed::ADMIN_ID,
                redemption.id,
                RedemptionStatus::Delivered,
                Some("TRK555000111".to_string()),
                None,
            )
            .await
            .unwrap();
        assert_eq!(delivered.tracking_number.as_deref(), Some("TRK555000111"));

        let after = service.balances_of(seed::BOB_ID).await.unwrap();
        assert_eq!(after.redemptions, 1);
    }
}
