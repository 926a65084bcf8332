// service/dashboard.rs
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{LedgerExt, NominationExt, PortalStore, ReferralExt, RewardExt, UserExt},
    models::{
        nominationmodel::NominationStatus,
        referralmodel::{Referral, ReferralStatus},
        rewardmodel::{Redemption, RedemptionStatus},
        transactionmodel::Transaction,
        usermodel::User,
    },
    service::{
        audit_service::{audit_entries, AuditEntry},
        error::ServiceError,
        ledger::PointBalances,
    },
};

const RECENT_TRANSACTIONS: usize = 5;
const RECENT_REDEMPTIONS: usize = 3;
const RECENT_REFERRALS: usize = 3;
const RECENT_ADMIN_ACTIVITY: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UserDashboard {
    pub user: User,
    pub balances: PointBalances,
    pub recent_transactions: Vec<Transaction>,
    pub recent_redemptions: Vec<Redemption>,
    pub recent_referrals: Vec<Referral>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub balances: PointBalances,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentStats {
    pub department: String,
    pub users: usize,
    pub points: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminOverview {
    pub total_users: usize,
    pub points_in_circulation: i64,
    pub pending_nominations: usize,
    pub active_referrals: usize,
    pub pending_redemptions: usize,
    pub recent_transactions: Vec<AuditEntry>,
    /// Ordered by department name.
    pub departments: Vec<DepartmentStats>,
}

#[derive(Debug, Clone)]
pub struct DashboardService {
    db_client: Arc<dyn PortalStore>,
}

impl DashboardService {
    pub fn new(db_client: Arc<dyn PortalStore>) -> Self {
        Self { db_client }
    }

    pub async fn user_dashboard(&self, user_id: Uuid) -> Result<UserDashboard, ServiceError> {
        let user = self
            .db_client
            .get_user(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let mut transactions = self.db_client.get_transactions(Some(user_id)).await?;
        let balances = PointBalances::from_transactions(&transactions);
        transactions.truncate(RECENT_TRANSACTIONS);

        let mut redemptions = self.db_client.get_redemptions(Some(user_id), None).await?;
        redemptions.truncate(RECENT_REDEMPTIONS);

        let mut referrals = self.db_client.get_referrals(Some(user_id), None).await?;
        referrals.truncate(RECENT_REFERRALS);

        Ok(UserDashboard {
            user,
            balances,
            recent_transactions: transactions,
            recent_redemptions: redemptions,
            recent_referrals: referrals,
        })
    }

    /// Every user with their current balances, ordered by name.
    pub async fn user_summaries(&self) -> Result<Vec<UserSummary>, ServiceError> {
        let users = self.db_client.get_users().await?;

        let mut ledgers: HashMap<Uuid, Vec<Transaction>> = HashMap::new();
        for transaction in self.db_client.get_transactions(None).await? {
            ledgers.entry(transaction.user_id).or_default().push(transaction);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let balances = ledgers
                    .get(&user.id)
                    .map(|ledger| PointBalances::from_transactions(ledger))
                    .unwrap_or_default();
                UserSummary { user, balances }
            })
            .collect())
    }

    pub async fn admin_overview(&self) -> Result<AdminOverview, ServiceError> {
        let users = self.db_client.get_users().await?;
        let mut ledger = self.db_client.get_transactions(None).await?;

        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for t in ledger.iter().filter(|t| t.counts()) {
            *totals.entry(t.user_id).or_default() += t.amount as i64;
        }
        let points_in_circulation: i64 = totals.values().sum();

        let mut departments: BTreeMap<&str, DepartmentStats> = BTreeMap::new();
        for user in &users {
            let stats = departments
                .entry(user.department.as_str())
                .or_insert_with(|| DepartmentStats {
                    department: user.department.clone(),
                    ..DepartmentStats::default()
                });
            stats.users += 1;
            stats.points += totals.get(&user.id).copied().unwrap_or(0);
        }
        let departments: Vec<DepartmentStats> = departments.into_values().collect();

        ledger.truncate(RECENT_ADMIN_ACTIVITY);
        let recent_transactions = audit_entries(ledger, &users, Utc::now());

        let pending_nominations = self
            .db_client
            .get_nominations(None, Some(NominationStatus::Pending))
            .await?
            .len();

        let active_referrals = self
            .db_client
            .get_referrals(None, None)
            .await?
            .iter()
            .filter(|r| matches!(r.status, ReferralStatus::Applied | ReferralStatus::Interview))
            .count();

        let pending_redemptions = self
            .db_client
            .get_redemptions(None, Some(RedemptionStatus::Pending))
            .await?
            .len();

        Ok(AdminOverview {
            total_users: users.len(),
            points_in_circulation,
            pending_nominations,
            active_referrals,
            pending_redemptions,
            recent_transactions,
            departments,
        })
    }
}
