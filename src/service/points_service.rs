// service/points_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    db::{LedgerExt, PortalStore, UserExt},
    models::{
        transactionmodel::{Transaction, TransactionSource, TransactionStatus, TransactionType},
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        ledger::{filter_transactions, PointBalances},
    },
};

/// How long after creation an entry may still be reversed.
pub const REVERSAL_WINDOW_HOURS: i64 = 24;

/// Whether an admin may still void `transaction` at `now`: an approved
/// manual entry younger than the reversal window.
pub fn is_reversible(transaction: &Transaction, now: DateTime<Utc>) -> bool {
    transaction.status == TransactionStatus::Approved
        && transaction.source == TransactionSource::Manual
        && now - transaction.created_at <= Duration::hours(REVERSAL_WINDOW_HOURS)
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PointsService {
    db_client: Arc<dyn PortalStore>,
}

impl PointsService {
    pub fn new(db_client: Arc<dyn PortalStore>) -> Self {
        Self { db_client }
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    async fn require_admin(&self, actor_id: Uuid, action: &str) -> Result<User, ServiceError> {
        let actor = self.require_user(actor_id).await?;
        if actor.role != UserRole::Admin {
            return Err(ServiceError::Forbidden(actor_id, action.to_string()));
        }
        Ok(actor)
    }

    pub async fn balances(&self, user_id: Uuid) -> Result<PointBalances, ServiceError> {
        self.require_user(user_id).await?;
        let ledger = self.db_client.get_transactions(Some(user_id)).await?;
        Ok(PointBalances::from_transactions(&ledger))
    }

    pub async fn transactions(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, ServiceError> {
        self.require_user(user_id).await?;
        let ledger = self.db_client.get_transactions(Some(user_id)).await?;
        Ok(filter_transactions(
            ledger,
            filter.kind,
            filter.status,
            filter.search.as_deref(),
        ))
    }

    pub async fn award(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        kind: TransactionType,
        amount: i32,
        description: String,
    ) -> Result<Transaction, ServiceError> {
        let admin = self.require_admin(admin_id, "award points").await?;
        self.require_user(user_id).await?;

        if !kind.is_earning() {
            return Err(ServiceError::Validation(format!(
                "cannot award points of type {}",
                kind.to_str()
            )));
        }
        if amount < 1 {
            return Err(ServiceError::Validation(
                "award amount must be at least 1".to_string(),
            ));
        }

        let mut credit =
            Transaction::approved(user_id, kind, amount, description, TransactionSource::Manual);
        credit.approved_by = Some(admin.name);

        let credit = self.db_client.insert_transaction(&credit).await?;
        tracing::info!("Awarded {} {} points to {}", amount, kind.to_str(), user_id);
        Ok(credit)
    }

    pub async fn deduct(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        amount: i32,
        description: String,
    ) -> Result<Transaction, ServiceError> {
        let admin = self.require_admin(admin_id, "deduct points").await?;

        if amount < 1 {
            return Err(ServiceError::Validation(
                "deduction amount must be at least 1".to_string(),
            ));
        }

        let balances = self.balances(user_id).await?;
        if !balances.can_afford(amount) {
            return Err(ServiceError::InsufficientPoints {
                required: amount,
                available: balances.total_points,
            });
        }

        let mut debit = Transaction::approved(
            user_id,
            TransactionType::Deduction,
            -amount,
            description,
            TransactionSource::Manual,
        );
        debit.approved_by = Some(admin.name);

        let debit = match self.db_client.insert_debit(&debit).await? {
            Some(debit) => debit,
            None => {
                let balances = self.balances(user_id).await?;
                return Err(ServiceError::InsufficientPoints {
                    required: amount,
                    available: balances.total_points,
                });
            }
        };
        tracing::info!("Deducted {} points from {}", amount, user_id);
        Ok(debit)
    }

    /// Voids a recent approved manual entry. Entries written by a workflow
    /// (referral milestones, nominations, fair-use penalties, redemptions)
    /// stay tied to that workflow's records and cannot be reversed here.
    pub async fn reverse(
        &self,
        admin_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, ServiceError> {
        let admin = self.require_admin(admin_id, "reverse transactions").await?;

        let transaction = self
            .db_client
            .get_transaction(transaction_id)
            .await?
            .ok_or(ServiceError::TransactionNotFound(transaction_id))?;

        if transaction.status != TransactionStatus::Approved {
            return Err(ServiceError::Validation(format!(
                "transaction {} is not approved",
                transaction_id
            )));
        }
        match transaction.source {
            TransactionSource::Manual => {}
            TransactionSource::Redemption => {
                return Err(ServiceError::Validation(
                    "redemptions are refunded by rejecting the redemption".to_string(),
                ))
            }
            other => {
                return Err(ServiceError::Validation(format!(
                    "{} entries can only be changed through their workflow",
                    other.to_str()
                )))
            }
        }
        if !is_reversible(&transaction, Utc::now()) {
            return Err(ServiceError::Validation(format!(
                "transactions can only be reversed within {} hours",
                REVERSAL_WINDOW_HOURS
            )));
        }

        let reversed = self
            .db_client
            .update_transaction_status(
                transaction_id,
                TransactionStatus::Approved,
                TransactionStatus::Rejected,
                Some(admin.name),
            )
            .await?
            .ok_or(ServiceError::ConcurrentUpdate(transaction_id))?;

        tracing::warn!(
            "Transaction {} ({} {}) reversed by {}",
            transaction_id,
            reversed.amount,
            reversed.kind.to_str(),
            admin_id
        );
        Ok(reversed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed, MemoryDb, ReferralExt};
    use crate::models::referralmodel::ReferralStatus;
    use crate::service::{fair_use::FairUsePolicy, referral_service::ReferralService};

    async fn setup() -> (Arc<MemoryDb>, PointsService) {
        let db = Arc::new(MemoryDb::new());
        seed::seed_demo_data(db.as_ref()).await.unwrap();
        let service = PointsService::new(db.clone());
        (db, service)
    }

    #[tokio::test]
    async fn test_award_moves_category_and_total() {
        let (_, service) = setup().await;
        let before = service.balances(seed::ALICE_ID).await.unwrap();

        let tx = service
            .award(seed::ADMIN_ID, seed::ALICE_ID, TransactionType::Travel, 4, "Client visit Pune".to_string())
            .await
            .unwrap();
        assert_eq!(tx.approved_by.as_deref(), Some("Admin User"));

        let after = service.balances(seed::ALICE_ID).await.unwrap();
        assert_eq!(after.travel_miles, before.travel_miles + 4);
        assert_eq!(after.total_points, before.total_points + 4);
        assert!(after.is_consistent());
    }

    #[tokio::test]
    async fn test_award_rules() {
        let (_, service) = setup().await;
        let not_admin = service
            .award(seed::SARAH_ID, seed::ALICE_ID, TransactionType::Travel, 4, "x".to_string())
            .await;
        assert!(matches!(not_admin, Err(ServiceError::Forbidden(..))));

        let zero = service
            .award(seed::ADMIN_ID, seed::ALICE_ID, TransactionType::Travel, 0, "x".to_string())
            .await;
        assert!(matches!(zero, Err(ServiceError::Validation(_))));

        let wrong_kind = service
            .award(seed::ADMIN_ID, seed::ALICE_ID, TransactionType::Redemption, 3, "x".to_string())
            .await;
        assert!(matches!(wrong_kind, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_deduct_cannot_exceed_total() {
        let (_, service) = setup().await;
        let too_much = service
            .deduct(seed::ADMIN_ID, seed::JOHN_ID, 36, "Policy breach".to_string())
            .await;
        assert!(matches!(
            too_much,
            Err(ServiceError::InsufficientPoints { required: 36, available: 35 })
        ));

        service
            .deduct(seed::ADMIN_ID, seed::JOHN_ID, 35, "Policy breach".to_string())
            .await
            .unwrap();
        let balances = service.balances(seed::JOHN_ID).await.unwrap();
        assert_eq!(balances.total_points, 0);
        assert_eq!(balances.deductions, 35);
    }

    #[tokio::test]
    async fn test_reverse_recent_entry() {
        let (_, service) = setup().await;
        let tx = service
            .award(seed::ADMIN_ID, seed::BOB_ID, TransactionType::Performance, 6, "Deal closed".to_string())
            .await
            .unwrap();

        let reversed = service.reverse(seed::ADMIN_ID, tx.id).await.unwrap();
        assert_eq!(reversed.status, TransactionStatus::Rejected);

        let balances = service.balances(seed::BOB_ID).await.unwrap();
        assert_eq!(balances.performance_points, 18);

        let twice = service.reverse(seed::ADMIN_ID, tx.id).await;
        assert!(matches!(twice, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reverse_rejects_old_and_redemption_entries() {
        let (db, service) = setup().await;
        let ledger = db.get_transactions(Some(seed::JOHN_ID)).await.unwrap();

        let old = ledger.iter().find(|t| t.kind == TransactionType::Performance).unwrap();
        assert!(matches!(
            service.reverse(seed::ADMIN_ID, old.id).await,
            Err(ServiceError::Validation(_))
        ));

        let debit = ledger.iter().find(|t| t.kind == TransactionType::Redemption).unwrap();
        assert!(matches!(
            service.reverse(seed::ADMIN_ID, debit.id).await,
            Err(ServiceError::Validation(_))
        ));

        assert!(matches!(
            service.reverse(seed::ADMIN_ID, Uuid::new_v4()).await,
            Err(ServiceError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_workflow_entries_are_not_reversible() {
        let db = Arc::new(MemoryDb::new());
        seed::seed_demo_data(db.as_ref()).await.unwrap();
        let service = PointsService::new(db.clone());
        let referrals = ReferralService::new(db.clone(), FairUsePolicy::default());

        let referral = seed::sample_referral(seed::ALICE_ID, ReferralStatus::Hired, 3, 0);
        db.save_referral(&referral).await.unwrap();
        let credit = referrals.accrue(referral.id).await.unwrap().transaction.unwrap();
        assert!(!is_reversible(&credit, Utc::now()));

        let refused = service.reverse(seed::ADMIN_ID, credit.id).await;
        assert!(matches!(refused, Err(ServiceError::Validation(_))));

        // Ledger and referral still agree, so nothing is owed twice or lost.
        assert_eq!(db.get_transaction(credit.id).await.unwrap().unwrap().status, TransactionStatus::Approved);
        assert_eq!(referrals.accrue(referral.id).await.unwrap().credited, 0);
        assert_eq!(db.get_referral(referral.id).await.unwrap().unwrap().points_earned, 3);
    }

    #[tokio::test]
    async fn test_reversal_applies_once() {
        let (db, service) = setup().await;
        let tx = service
            .award(seed::ADMIN_ID, seed::BOB_ID, TransactionType::Travel, 2, "Site visit".to_string())
            .await
            .unwrap();
        assert!(is_reversible(&tx, Utc::now()));
        assert!(!is_reversible(&tx, Utc::now() + Duration::hours(REVERSAL_WINDOW_HOURS + 1)));

        service.reverse(seed::ADMIN_ID, tx.id).await.unwrap();
        let replay = db
            .update_transaction_status(tx.id, TransactionStatus::Approved, TransactionStatus::Rejected, None)
            .await
            .unwrap();
        assert!(replay.is_none());
    }

    #[tokio::test]
    async fn test_transaction_filters() {
        let (_, service) = setup().await;
        let redemptions = service
            .transactions(
                seed::JOHN_ID,
                TransactionFilter {
                    kind: Some(TransactionType::Redemption),
                    ..TransactionFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(redemptions.len(), 2);
        assert!(redemptions[0].created_at >= redemptions[1].created_at);

        let search = service
            .transactions(
                seed::JOHN_ID,
                TransactionFilter {
                    search: Some("excellence".to_string()),
                    ..TransactionFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(search.len(), 1);
    }
}
