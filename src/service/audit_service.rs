// service/audit_service.rs
use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{LedgerExt, PortalStore, UserExt},
    models::{
        status::{HasBadge, StatusBadge},
        transactionmodel::{Transaction, TransactionType},
        usermodel::User,
    },
    service::{error::ServiceError, points_service::is_reversible},
};

/// How far back the audit log looks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditPeriod {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl AuditPeriod {
    pub fn includes(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            AuditPeriod::All => true,
            AuditPeriod::Today => at.date_naive() == now.date_naive(),
            AuditPeriod::Week => now - at < Duration::days(7),
            AuditPeriod::Month => now - at < Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Matched against the description and the owner's name.
    pub search: Option<String>,
    pub kind: Option<TransactionType>,
    pub period: AuditPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub user_name: String,
    pub modified_by: String,
    pub can_reverse: bool,
    pub badge: StatusBadge,
}

impl AuditEntry {
    pub fn new(transaction: Transaction, user_name: String, now: DateTime<Utc>) -> Self {
        AuditEntry {
            modified_by: transaction
                .approved_by
                .clone()
                .unwrap_or_else(|| "System".to_string()),
            can_reverse: is_reversible(&transaction, now),
            badge: transaction.status.badge(),
            user_name,
            transaction,
        }
    }
}

/// Pairs ledger entries with their owners' names, keeping the input order.
pub fn audit_entries(
    transactions: Vec<Transaction>,
    users: &[User],
    now: DateTime<Utc>,
) -> Vec<AuditEntry> {
    let names: HashMap<Uuid, &str> = users.iter().map(|u| (u.id, u.name.as_str())).collect();

    transactions
        .into_iter()
        .map(|t| {
            let name = names.get(&t.user_id).copied().unwrap_or("Unknown User");
            AuditEntry::new(t, name.to_string(), now)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct AuditService {
    db_client: Arc<dyn PortalStore>,
}

impl AuditService {
    pub fn new(db_client: Arc<dyn PortalStore>) -> Self {
        Self { db_client }
    }

    /// Every ledger entry across users, newest first.
    pub async fn audit_log(
        &self,
        filter: &AuditFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, ServiceError> {
        let users = self.db_client.get_users().await?;
        let transactions = self.db_client.get_transactions(None).await?;

        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(audit_entries(transactions, &users, now)
            .into_iter()
            .filter(|e| filter.kind.map_or(true, |k| e.transaction.kind == k))
            .filter(|e| filter.period.includes(e.transaction.created_at, now))
            .filter(|e| {
                search.as_deref().map_or(true, |needle| {
                    e.transaction.description.to_lowercase().contains(needle)
                        || e.user_name.to_lowercase().contains(needle)
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{seed, MemoryDb},
        service::points_service::PointsService,
    };

    async fn setup() -> (Arc<MemoryDb>, AuditService) {
        let db = Arc::new(MemoryDb::new());
        seed::seed_demo_data(db.as_ref()).await.unwrap();
        let service = AuditService::new(db.clone());
        (db, service)
    }

    #[test]
    fn test_periods() {
        let now = Utc::now();
        assert!(AuditPeriod::All.includes(now - Duration::days(400), now));
        assert!(AuditPeriod::Week.includes(now - Duration::days(6), now));
        assert!(!AuditPeriod::Week.includes(now - Duration::days(8), now));
        assert!(AuditPeriod::Month.includes(now - Duration::days(29), now));
        assert!(!AuditPeriod::Month.includes(now - Duration::days(31), now));
        assert!(AuditPeriod::Today.includes(now, now));
    }

    #[tokio::test]
    async fn test_log_spans_all_users() {
        let (_, service) = setup().await;
        let log = service.audit_log(&AuditFilter::default(), Utc::now()).await.unwrap();
        assert_eq!(log.len(), 21);
        assert!(log.windows(2).all(|w| w[0].transaction.created_at >= w[1].transaction.created_at));

        let award = log
            .iter()
            .find(|e| e.transaction.description == "Q4 Performance Excellence Award")
            .unwrap();
        assert_eq!(award.user_name, "John Doe");
        assert_eq!(award.modified_by, "Admin User");
        assert!(!award.can_reverse);
    }

    #[tokio::test]
    async fn test_search_matches_name_or_description() {
        let (_, service) = setup().await;
        let by_name = AuditFilter {
            search: Some("doe".to_string()),
            ..AuditFilter::default()
        };
        assert_eq!(service.audit_log(&by_name, Utc::now()).await.unwrap().len(), 7);

        let by_description = AuditFilter {
            search: Some("MUMBAI".to_string()),
            ..AuditFilter::default()
        };
        let hits = service.audit_log(&by_description, Utc::now()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user_name, "Sarah Manager");
    }

    #[tokio::test]
    async fn test_type_and_period_filters() {
        let (db, service) = setup().await;
        let redemptions = AuditFilter {
            kind: Some(TransactionType::Redemption),
            ..AuditFilter::default()
        };
        assert_eq!(service.audit_log(&redemptions, Utc::now()).await.unwrap().len(), 3);

        PointsService::new(db.clone())
            .award(seed::ADMIN_ID, seed::ALICE_ID, TransactionType::Travel, 3, "Offsite".to_string())
            .await
            .unwrap();

        let this_week = AuditFilter {
            period: AuditPeriod::Week,
            ..AuditFilter::default()
        };
        let recent = service.audit_log(&this_week, Utc::now()).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].user_name, "Alice Smith");
        assert!(recent[0].can_reverse);
    }
}
