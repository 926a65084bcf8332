// db/memorydb.rs
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ledgerdb::LedgerExt, nominationdb::NominationExt, referraldb::ReferralExt,
    rewarddb::RewardExt, userdb::UserExt,
};
use crate::models::{
    nominationmodel::{Nomination, NominationStatus},
    referralmodel::{Referral, ReferralStatus},
    rewardmodel::{Redemption, RedemptionStatus, RewardItem},
    transactionmodel::{Transaction, TransactionSource, TransactionStatus},
    usermodel::User,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    referrals: HashMap<Uuid, Referral>,
    transactions: HashMap<Uuid, Transaction>,
    rewards: HashMap<Uuid, RewardItem>,
    redemptions: HashMap<Uuid, Redemption>,
    nominations: HashMap<Uuid, Nomination>,
}

impl Tables {
    fn approved_total(&self, user_id: Uuid) -> i64 {
        self.transactions
            .values()
            .filter(|t| t.user_id == user_id && t.counts())
            .map(|t| t.amount as i64)
            .sum()
    }

    fn penalties_applied(&self, user_id: Uuid) -> i64 {
        self.transactions
            .values()
            .filter(|t| {
                t.user_id == user_id && t.source == TransactionSource::FairUsePenalty && t.counts()
            })
            .map(|t| -(t.amount as i64))
            .sum()
    }
}

/// Process-local store. Every table sits behind one lock so multi-record
/// writes (credit + ledger entry) are atomic.
#[derive(Debug, Default, Clone)]
pub struct MemoryDb {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        MemoryDb::default()
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl UserExt for MemoryDb {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn save_user(&self, user: &User) -> Result<User, sqlx::Error> {
        self.tables.write().await.users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl ReferralExt for MemoryDb {
    async fn get_referral(&self, referral_id: Uuid) -> Result<Option<Referral>, sqlx::Error> {
        Ok(self.tables.read().await.referrals.get(&referral_id).cloned())
    }

    async fn save_referral(&self, referral: &Referral) -> Result<Referral, sqlx::Error> {
        let mut tables = self.tables.write().await;
        let mut saved = referral.clone();
        if let Some(existing) = tables.referrals.get(&referral.id) {
            saved.points_earned = existing.points_earned;
        }
        tables.referrals.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn insert_referral_within_cap(
        &self,
        referral: &Referral,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        let submitted = tables
            .referrals
            .values()
            .filter(|r| r.referrer_id == referral.referrer_id && r.date_submitted >= since)
            .count() as i64;
        if submitted >= limit {
            return Ok(None);
        }
        tables.referrals.insert(referral.id, referral.clone());
        Ok(Some(referral.clone()))
    }

    async fn transition_referral(
        &self,
        referral_id: Uuid,
        from: ReferralStatus,
        to: ReferralStatus,
        hired_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .referrals
            .get_mut(&referral_id)
            .filter(|r| r.status == from)
            .map(|r| {
                r.status = to;
                if hired_at.is_some() {
                    r.hired_at = hired_at;
                    r.months_completed = 0;
                }
                r.clone()
            }))
    }

    async fn record_referral_tenure(
        &self,
        referral_id: Uuid,
        months: i32,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .referrals
            .get_mut(&referral_id)
            .filter(|r| r.status == ReferralStatus::Hired && r.months_completed <= months)
            .map(|r| {
                r.months_completed = months;
                r.clone()
            }))
    }

    async fn get_referrals(
        &self,
        referrer_id: Option<Uuid>,
        status: Option<ReferralStatus>,
    ) -> Result<Vec<Referral>, sqlx::Error> {
        let tables = self.tables.read().await;
        let rows = tables
            .referrals
            .values()
            .filter(|r| referrer_id.map_or(true, |id| r.referrer_id == id))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |r: &Referral| r.date_submitted))
    }

    async fn credit_referral_points(
        &self,
        referral_id: Uuid,
        expected_points: i32,
        transaction: &Transaction,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let mut tables = self.tables.write().await;

        let updated = match tables.referrals.get_mut(&referral_id) {
            Some(referral) if referral.points_earned == expected_points => {
                referral.points_earned += transaction.amount;
                referral.clone()
            }
            _ => return Ok(None),
        };

        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(Some(updated))
    }
}

#[async_trait]
impl LedgerExt for MemoryDb {
    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction, sqlx::Error> {
        self.tables
            .write()
            .await
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction.clone())
    }

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Option<Transaction>, sqlx::Error> {
        Ok(self.tables.read().await.transactions.get(&transaction_id).cloned())
    }

    async fn get_transactions(&self, user_id: Option<Uuid>) -> Result<Vec<Transaction>, sqlx::Error> {
        let tables = self.tables.read().await;
        let rows = tables
            .transactions
            .values()
            .filter(|t| user_id.map_or(true, |id| t.user_id == id))
            .cloned()
            .collect();
        Ok(newest_first(rows, |t: &Transaction| t.created_at))
    }

    async fn update_transaction_status(
        &self,
        transaction_id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
        approved_by: Option<String>,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .transactions
            .get_mut(&transaction_id)
            .filter(|t| t.status == from)
            .map(|t| {
                t.status = to;
                if approved_by.is_some() {
                    t.approved_by = approved_by;
                }
                t.clone()
            }))
    }

    async fn insert_debit(&self, debit: &Transaction) -> Result<Option<Transaction>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        if tables.approved_total(debit.user_id) + (debit.amount as i64) < 0 {
            return Ok(None);
        }
        tables.transactions.insert(debit.id, debit.clone());
        Ok(Some(debit.clone()))
    }

    async fn insert_penalty(
        &self,
        penalty: &Transaction,
        already_applied: i32,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        if tables.penalties_applied(penalty.user_id) != already_applied as i64 {
            return Ok(None);
        }
        tables.transactions.insert(penalty.id, penalty.clone());
        Ok(Some(penalty.clone()))
    }
}

#[async_trait]
impl RewardExt for MemoryDb {
    async fn get_rewards(&self) -> Result<Vec<RewardItem>, sqlx::Error> {
        let mut rewards: Vec<RewardItem> =
            self.tables.read().await.rewards.values().cloned().collect();
        rewards.sort_by(|a, b| b.points_cost.cmp(&a.points_cost).then_with(|| a.name.cmp(&b.name)));
        Ok(rewards)
    }

    async fn get_reward(&self, reward_id: Uuid) -> Result<Option<RewardItem>, sqlx::Error> {
        Ok(self.tables.read().await.rewards.get(&reward_id).cloned())
    }

    async fn save_reward(&self, reward: &RewardItem) -> Result<RewardItem, sqlx::Error> {
        self.tables.write().await.rewards.insert(reward.id, reward.clone());
        Ok(reward.clone())
    }

    async fn create_redemption(
        &self,
        redemption: &Redemption,
        debit: &Transaction,
    ) -> Result<Option<Redemption>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        if tables.approved_total(debit.user_id) + (debit.amount as i64) < 0 {
            return Ok(None);
        }
        tables.transactions.insert(debit.id, debit.clone());
        tables.redemptions.insert(redemption.id, redemption.clone());
        Ok(Some(redemption.clone()))
    }

    async fn get_redemption(&self, redemption_id: Uuid) -> Result<Option<Redemption>, sqlx::Error> {
        Ok(self.tables.read().await.redemptions.get(&redemption_id).cloned())
    }

    async fn get_redemptions(
        &self,
        user_id: Option<Uuid>,
        status: Option<RedemptionStatus>,
    ) -> Result<Vec<Redemption>, sqlx::Error> {
        let tables = self.tables.read().await;
        let rows = tables
            .redemptions
            .values()
            .filter(|r| user_id.map_or(true, |id| r.user_id == id))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |r: &Redemption| r.date_submitted))
    }

    async fn update_redemption(
        &self,
        redemption: &Redemption,
        from: RedemptionStatus,
        refund: bool,
    ) -> Result<Option<Redemption>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        match tables.redemptions.get(&redemption.id) {
            Some(stored) if stored.status == from => {}
            _ => return Ok(None),
        }
        tables.redemptions.insert(redemption.id, redemption.clone());
        if refund {
            if let Some(debit) = tables.transactions.get_mut(&redemption.transaction_id) {
                debit.status = TransactionStatus::Rejected;
            }
        }
        Ok(Some(redemption.clone()))
    }
}

#[async_trait]
impl NominationExt for MemoryDb {
    async fn save_nomination(&self, nomination: &Nomination) -> Result<Nomination, sqlx::Error> {
        self.tables
            .write()
            .await
            .nominations
            .insert(nomination.id, nomination.clone());
        Ok(nomination.clone())
    }

    async fn get_nomination(&self, nomination_id: Uuid) -> Result<Option<Nomination>, sqlx::Error> {
        Ok(self.tables.read().await.nominations.get(&nomination_id).cloned())
    }

    async fn get_nominations(
        &self,
        nominator_id: Option<Uuid>,
        status: Option<NominationStatus>,
    ) -> Result<Vec<Nomination>, sqlx::Error> {
        let tables = self.tables.read().await;
        let rows = tables
            .nominations
            .values()
            .filter(|n| nominator_id.map_or(true, |id| n.nominator_id == id))
            .filter(|n| status.map_or(true, |s| n.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |n: &Nomination| n.date_submitted))
    }

    async fn decide_nomination(
        &self,
        nomination: &Nomination,
        credit: Option<&Transaction>,
    ) -> Result<Option<Nomination>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        match tables.nominations.get(&nomination.id) {
            Some(stored) if stored.status == NominationStatus::Pending => {}
            _ => return Ok(None),
        }
        tables.nominations.insert(nomination.id, nomination.clone());
        if let Some(credit) = credit {
            tables.transactions.insert(credit.id, credit.clone());
        }
        Ok(Some(nomination.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed;
    use crate::models::transactionmodel::{TransactionSource, TransactionType};

    #[tokio::test]
    async fn test_credit_is_conditional_on_expected_points() {
        let db = MemoryDb::new();
        let referral = seed::sample_referral(Uuid::new_v4(), ReferralStatus::Hired, 6, 3);
        db.save_referral(&referral).await.unwrap();

        let credit = Transaction::approved(
            referral.referrer_id,
            TransactionType::Referral,
            2,
            "6-month milestone",
            TransactionSource::ReferralMilestone,
        );

        let stale = db.credit_referral_points(referral.id, 0, &credit).await.unwrap();
        assert!(stale.is_none());
        assert!(db.get_transactions(None).await.unwrap().is_empty());

        let updated = db.credit_referral_points(referral.id, 3, &credit).await.unwrap().unwrap();
        assert_eq!(updated.points_earned, 5);
        assert_eq!(db.get_transactions(Some(referral.referrer_id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_referral_filters_and_ordering() {
        let db = MemoryDb::new();
        let referrer = Uuid::new_v4();
        let mut older = seed::sample_referral(referrer, ReferralStatus::Applied, 0, 0);
        older.date_submitted = Utc::now() - chrono::Duration::days(40);
        let newer = seed::sample_referral(referrer, ReferralStatus::Hired, 3, 0);
        let stranger = seed::sample_referral(Uuid::new_v4(), ReferralStatus::Hired, 3, 0);
        for r in [&older, &newer, &stranger] {
            db.save_referral(r).await.unwrap();
        }

        let mine = db.get_referrals(Some(referrer), None).await.unwrap();
        assert_eq!(mine, vec![newer.clone(), older]);

        let hired = db.get_referrals(None, Some(ReferralStatus::Hired)).await.unwrap();
        assert_eq!(hired.len(), 2);

    }

    #[tokio::test]
    async fn test_save_never_rewrites_points_earned() {
        let db = MemoryDb::new();
        let referral = seed::sample_referral(Uuid::new_v4(), ReferralStatus::Hired, 3, 0);
        db.save_referral(&referral).await.unwrap();

        let credit = Transaction::approved(
            referral.referrer_id,
            TransactionType::Referral,
            3,
            "3-month milestone",
            TransactionSource::ReferralMilestone,
        );
        db.credit_referral_points(referral.id, 0, &credit).await.unwrap().unwrap();

        // A writer holding the pre-credit row saves it back.
        let mut stale = referral.clone();
        stale.months_completed = 6;
        let saved = db.save_referral(&stale).await.unwrap();
        assert_eq!(saved.points_earned, 3);
        assert_eq!(db.get_referral(referral.id).await.unwrap().unwrap().points_earned, 3);
    }

    #[tokio::test]
    async fn test_cap_and_guards_are_checked_under_the_lock() {
        let db = MemoryDb::new();
        let referrer = Uuid::new_v4();
        let since = Utc::now() - chrono::Duration::days(7);

        let first = seed::sample_referral(referrer, ReferralStatus::Applied, 0, 0);
        assert!(db.insert_referral_within_cap(&first, since, 1).await.unwrap().is_some());
        let second = seed::sample_referral(referrer, ReferralStatus::Applied, 0, 0);
        assert!(db.insert_referral_within_cap(&second, since, 1).await.unwrap().is_none());

        let moved = db
            .transition_referral(first.id, ReferralStatus::Applied, ReferralStatus::Interview, None)
            .await
            .unwrap();
        assert_eq!(moved.unwrap().status, ReferralStatus::Interview);
        let replay = db
            .transition_referral(first.id, ReferralStatus::Applied, ReferralStatus::Interview, None)
            .await
            .unwrap();
        assert!(replay.is_none());

        assert!(db.record_referral_tenure(first.id, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_debit_needs_covering_balance() {
        let db = MemoryDb::new();
        let user = Uuid::new_v4();
        let credit = Transaction::approved(user, TransactionType::Travel, 5, "Trip", TransactionSource::Manual);
        db.insert_transaction(&credit).await.unwrap();

        let debit = |amount: i32| {
            Transaction::approved(user, TransactionType::Deduction, -amount, "Adjustment", TransactionSource::Manual)
        };
        assert!(db.insert_debit(&debit(6)).await.unwrap().is_none());
        assert!(db.insert_debit(&debit(5)).await.unwrap().is_some());
        assert!(db.insert_debit(&debit(1)).await.unwrap().is_none());
    }
}
