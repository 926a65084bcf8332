// db/rewarddb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{
    db::DBClient,
    ledgerdb::{approved_total_in, insert_transaction_in, lock_user_in, set_transaction_status_in},
};
use crate::models::{
    rewardmodel::{Redemption, RedemptionStatus, RewardItem},
    transactionmodel::{Transaction, TransactionStatus},
};

const REWARD_COLUMNS: &str =
    "id, name, description, points_cost, category, image, available, max_value";

const REDEMPTION_COLUMNS: &str = r#"
    id, user_id, reward_id, item_name, points_used, date_submitted, status,
    transaction_id, reference_number, delivery_address, tracking_number, notes
"#;

#[async_trait]
pub trait RewardExt {
    /// Catalogue ordered from most to least expensive.
    async fn get_rewards(&self) -> Result<Vec<RewardItem>, sqlx::Error>;

    async fn get_reward(&self, reward_id: Uuid) -> Result<Option<RewardItem>, sqlx::Error>;

    async fn save_reward(&self, reward: &RewardItem) -> Result<RewardItem, sqlx::Error>;

    /// Stores the redemption together with its debit entry. Returns `None`
    /// when the user's approved total no longer covers the debit.
    async fn create_redemption(
        &self,
        redemption: &Redemption,
        debit: &Transaction,
    ) -> Result<Option<Redemption>, sqlx::Error>;

    async fn get_redemption(&self, redemption_id: Uuid) -> Result<Option<Redemption>, sqlx::Error>;

    /// Newest first.
    async fn get_redemptions(
        &self,
        user_id: Option<Uuid>,
        status: Option<RedemptionStatus>,
    ) -> Result<Vec<Redemption>, sqlx::Error>;

    /// Persists status, tracking number and notes, provided the stored
    /// redemption is still in `from`. With `refund` the linked debit entry is
    /// rejected in the same step.
    async fn update_redemption(
        &self,
        redemption: &Redemption,
        from: RedemptionStatus,
        refund: bool,
    ) -> Result<Option<Redemption>, sqlx::Error>;
}

#[async_trait]
impl RewardExt for DBClient {
    async fn get_rewards(&self) -> Result<Vec<RewardItem>, sqlx::Error> {
        sqlx::query_as::<_, RewardItem>(&format!(
            "SELECT {} FROM rewards ORDER BY points_cost DESC, name ASC",
            REWARD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_reward(&self, reward_id: Uuid) -> Result<Option<RewardItem>, sqlx::Error> {
        sqlx::query_as::<_, RewardItem>(&format!(
            "SELECT {} FROM rewards WHERE id = $1",
            REWARD_COLUMNS
        ))
        .bind(reward_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_reward(&self, reward: &RewardItem) -> Result<RewardItem, sqlx::Error> {
        sqlx::query_as::<_, RewardItem>(&format!(
            r#"
            INSERT INTO rewards ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                points_cost = EXCLUDED.points_cost,
                category = EXCLUDED.category,
                image = EXCLUDED.image,
                available = EXCLUDED.available,
                max_value = EXCLUDED.max_value
            RETURNING {cols}
            "#,
            cols = REWARD_COLUMNS
        ))
        .bind(reward.id)
        .bind(&reward.name)
        .bind(&reward.description)
        .bind(reward.points_cost)
        .bind(&reward.category)
        .bind(&reward.image)
        .bind(reward.available)
        .bind(reward.max_value)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_redemption(
        &self,
        redemption: &Redemption,
        debit: &Transaction,
    ) -> Result<Option<Redemption>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        lock_user_in(&mut tx, debit.user_id).await?;
        let total = approved_total_in(&mut tx, debit.user_id).await?;
        if total + (debit.amount as i64) < 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        insert_transaction_in(&mut tx, debit).await?;

        let created = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            INSERT INTO redemptions ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {cols}
            "#,
            cols = REDEMPTION_COLUMNS
        ))
        .bind(redemption.id)
        .bind(redemption.user_id)
        .bind(redemption.reward_id)
        .bind(&redemption.item_name)
        .bind(redemption.points_used)
        .bind(redemption.date_submitted)
        .bind(redemption.status)
        .bind(redemption.transaction_id)
        .bind(&redemption.reference_number)
        .bind(&redemption.delivery_address)
        .bind(&redemption.tracking_number)
        .bind(&redemption.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn get_redemption(&self, redemption_id: Uuid) -> Result<Option<Redemption>, sqlx::Error> {
        sqlx::query_as::<_, Redemption>(&format!(
            "SELECT {} FROM redemptions WHERE id = $1",
            REDEMPTION_COLUMNS
        ))
        .bind(redemption_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_redemptions(
        &self,
        user_id: Option<Uuid>,
        status: Option<RedemptionStatus>,
    ) -> Result<Vec<Redemption>, sqlx::Error> {
        sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {}
            FROM redemptions
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::redemption_status IS NULL OR status = $2)
            ORDER BY date_submitted DESC
            "#,
            REDEMPTION_COLUMNS
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_redemption(
        &self,
        redemption: &Redemption,
        from: RedemptionStatus,
        refund: bool,
    ) -> Result<Option<Redemption>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE redemptions
            SET status = $2, tracking_number = $3, notes = $4
            WHERE id = $1 AND status = $5
            RETURNING {}
            "#,
            REDEMPTION_COLUMNS
        ))
        .bind(redemption.id)
        .bind(redemption.status)
        .bind(&redemption.tracking_number)
        .bind(&redemption.notes)
        .bind(from)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        if refund {
            set_transaction_status_in(&mut tx, redemption.transaction_id, TransactionStatus::Rejected)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(updated))
    }
}
