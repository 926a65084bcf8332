// db/referraldb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    db::DBClient,
    ledgerdb::{insert_transaction_in, lock_user_in},
};
use crate::models::{
    referralmodel::{Referral, ReferralStatus},
    transactionmodel::Transaction,
};

const REFERRAL_COLUMNS: &str = r#"
    id, referrer_id, candidate_name, candidate_email, candidate_phone,
    position, relationship, years_known, date_submitted, status,
    points_earned, months_completed, hired_at
"#;

#[async_trait]
pub trait ReferralExt {
    async fn get_referral(&self, referral_id: Uuid) -> Result<Option<Referral>, sqlx::Error>;

    /// Insert, or overwrite candidate details, status and tenure by id.
    /// `points_earned` is only set on insert; afterwards it moves solely
    /// through `credit_referral_points`.
    async fn save_referral(&self, referral: &Referral) -> Result<Referral, sqlx::Error>;

    /// Inserts a new submission unless the referrer already has `limit`
    /// submissions since `since`.
    async fn insert_referral_within_cap(
        &self,
        referral: &Referral,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Option<Referral>, sqlx::Error>;

    /// Moves a referral from `from` to `to`. A `hired_at` stamp also resets
    /// tenure. Returns `None` when the referral is no longer in `from`.
    async fn transition_referral(
        &self,
        referral_id: Uuid,
        from: ReferralStatus,
        to: ReferralStatus,
        hired_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Referral>, sqlx::Error>;

    /// Sets tenure on a hired referral without touching anything else.
    /// Returns `None` unless the referral is hired and `months` does not go
    /// backwards.
    async fn record_referral_tenure(
        &self,
        referral_id: Uuid,
        months: i32,
    ) -> Result<Option<Referral>, sqlx::Error>;

    /// Newest submissions first.
    async fn get_referrals(
        &self,
        referrer_id: Option<Uuid>,
        status: Option<ReferralStatus>,
    ) -> Result<Vec<Referral>, sqlx::Error>;

    /// Adds `transaction.amount` to `points_earned` and records the ledger
    /// entry in one step, provided `points_earned` still equals
    /// `expected_points`. Returns `None` when another writer got there first.
    async fn credit_referral_points(
        &self,
        referral_id: Uuid,
        expected_points: i32,
        transaction: &Transaction,
    ) -> Result<Option<Referral>, sqlx::Error>;
}

#[async_trait]
impl ReferralExt for DBClient {
    async fn get_referral(&self, referral_id: Uuid) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(&format!(
            "SELECT {} FROM referrals WHERE id = $1",
            REFERRAL_COLUMNS
        ))
        .bind(referral_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_referral(&self, referral: &Referral) -> Result<Referral, sqlx::Error> {
        sqlx::query_as::<_, Referral>(&format!(
            r#"
            INSERT INTO referrals ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE
            SET candidate_name = EXCLUDED.candidate_name,
                candidate_email = EXCLUDED.candidate_email,
                candidate_phone = EXCLUDED.candidate_phone,
                position = EXCLUDED.position,
                relationship = EXCLUDED.relationship,
                years_known = EXCLUDED.years_known,
                status = EXCLUDED.status,
                months_completed = EXCLUDED.months_completed,
                hired_at = EXCLUDED.hired_at
            RETURNING {cols}
            "#,
            cols = REFERRAL_COLUMNS
        ))
        .bind(referral.id)
        .bind(referral.referrer_id)
        .bind(&referral.candidate_name)
        .bind(&referral.candidate_email)
        .bind(&referral.candidate_phone)
        .bind(&referral.position)
        .bind(&referral.relationship)
        .bind(referral.years_known)
        .bind(referral.date_submitted)
        .bind(referral.status)
        .bind(referral.points_earned)
        .bind(referral.months_completed)
        .bind(referral.hired_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_referrals(
        &self,
        referrer_id: Option<Uuid>,
        status: Option<ReferralStatus>,
    ) -> Result<Vec<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(&format!(
            r#"
            SELECT {}
            FROM referrals
            WHERE ($1::uuid IS NULL OR referrer_id = $1)
              AND ($2::referral_status IS NULL OR status = $2)
            ORDER BY date_submitted DESC
            "#,
            REFERRAL_COLUMNS
        ))
        .bind(referrer_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_referral_within_cap(
        &self,
        referral: &Referral,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        lock_user_in(&mut tx, referral.referrer_id).await?;
        let submitted = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM referrals WHERE referrer_id = $1 AND date_submitted >= $2",
        )
        .bind(referral.referrer_id)
        .bind(since)
        .fetch_one(&mut *tx)
        .await?;

        if submitted >= limit {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query_as::<_, Referral>(&format!(
            r#"
            INSERT INTO referrals ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {cols}
            "#,
            cols = REFERRAL_COLUMNS
        ))
        .bind(referral.id)
        .bind(referral.referrer_id)
        .bind(&referral.candidate_name)
        .bind(&referral.candidate_email)
        .bind(&referral.candidate_phone)
        .bind(&referral.position)
        .bind(&referral.relationship)
        .bind(referral.years_known)
        .bind(referral.date_submitted)
        .bind(referral.status)
        .bind(referral.points_earned)
        .bind(referral.months_completed)
        .bind(referral.hired_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(inserted))
    }

    async fn transition_referral(
        &self,
        referral_id: Uuid,
        from: ReferralStatus,
        to: ReferralStatus,
        hired_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(&format!(
            r#"
            UPDATE referrals
            SET status = $3,
                hired_at = COALESCE($4, hired_at),
                months_completed = CASE WHEN $4::timestamptz IS NULL THEN months_completed ELSE 0 END
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REFERRAL_COLUMNS
        ))
        .bind(referral_id)
        .bind(from)
        .bind(to)
        .bind(hired_at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_referral_tenure(
        &self,
        referral_id: Uuid,
        months: i32,
    ) -> Result<Option<Referral>, sqlx::Error> {
        sqlx::query_as::<_, Referral>(&format!(
            r#"
            UPDATE referrals
            SET months_completed = $2
            WHERE id = $1 AND status = 'hired' AND months_completed <= $2
            RETURNING {}
            "#,
            REFERRAL_COLUMNS
        ))
        .bind(referral_id)
        .bind(months)
        .fetch_optional(&self.pool)
        .await
    }

    async fn credit_referral_points(
        &self,
        referral_id: Uuid,
        expected_points: i32,
        transaction: &Transaction,
    ) -> Result<Option<Referral>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Referral>(&format!(
            r#"
            UPDATE referrals
            SET points_earned = points_earned + $3
            WHERE id = $1 AND points_earned = $2
            RETURNING {}
            "#,
            REFERRAL_COLUMNS
        ))
        .bind(referral_id)
        .bind(expected_points)
        .bind(transaction.amount)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        insert_transaction_in(&mut tx, transaction).await?;
        tx.commit().await?;

        Ok(updated)
    }
}
