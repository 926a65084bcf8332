// db/nominationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, ledgerdb::insert_transaction_in};
use crate::models::{
    nominationmodel::{Nomination, NominationStatus},
    transactionmodel::Transaction,
};

const NOMINATION_COLUMNS: &str = r#"
    id, nominator_id, employee_id, points, reason, date_submitted, status,
    approved_by, approved_date
"#;

#[async_trait]
pub trait NominationExt {
    async fn save_nomination(&self, nomination: &Nomination) -> Result<Nomination, sqlx::Error>;

    async fn get_nomination(&self, nomination_id: Uuid) -> Result<Option<Nomination>, sqlx::Error>;

    /// Newest first.
    async fn get_nominations(
        &self,
        nominator_id: Option<Uuid>,
        status: Option<NominationStatus>,
    ) -> Result<Vec<Nomination>, sqlx::Error>;

    /// Stores the decision and, for approvals, the performance credit.
    /// Returns `None` when the stored nomination is no longer pending.
    async fn decide_nomination(
        &self,
        nomination: &Nomination,
        credit: Option<&Transaction>,
    ) -> Result<Option<Nomination>, sqlx::Error>;
}

#[async_trait]
impl NominationExt for DBClient {
    async fn save_nomination(&self, nomination: &Nomination) -> Result<Nomination, sqlx::Error> {
        sqlx::query_as::<_, Nomination>(&format!(
            r#"
            INSERT INTO nominations ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status,
                approved_by = EXCLUDED.approved_by,
                approved_date = EXCLUDED.approved_date
            RETURNING {cols}
            "#,
            cols = NOMINATION_COLUMNS
        ))
        .bind(nomination.id)
        .bind(nomination.nominator_id)
        .bind(nomination.employee_id)
        .bind(nomination.points)
        .bind(&nomination.reason)
        .bind(nomination.date_submitted)
        .bind(nomination.status)
        .bind(&nomination.approved_by)
        .bind(nomination.approved_date)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_nomination(&self, nomination_id: Uuid) -> Result<Option<Nomination>, sqlx::Error> {
        sqlx::query_as::<_, Nomination>(&format!(
            "SELECT {} FROM nominations WHERE id = $1",
            NOMINATION_COLUMNS
        ))
        .bind(nomination_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_nominations(
        &self,
        nominator_id: Option<Uuid>,
        status: Option<NominationStatus>,
    ) -> Result<Vec<Nomination>, sqlx::Error> {
        sqlx::query_as::<_, Nomination>(&format!(
            r#"
            SELECT {}
            FROM nominations
            WHERE ($1::uuid IS NULL OR nominator_id = $1)
              AND ($2::nomination_status IS NULL OR status = $2)
            ORDER BY date_submitted DESC
            "#,
            NOMINATION_COLUMNS
        ))
        .bind(nominator_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn decide_nomination(
        &self,
        nomination: &Nomination,
        credit: Option<&Transaction>,
    ) -> Result<Option<Nomination>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let decided = sqlx::query_as::<_, Nomination>(&format!(
            r#"
            UPDATE nominations
            SET status = $2, approved_by = $3, approved_date = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            NOMINATION_COLUMNS
        ))
        .bind(nomination.id)
        .bind(nomination.status)
        .bind(&nomination.approved_by)
        .bind(nomination.approved_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(decided) = decided else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(credit) = credit {
            insert_transaction_in(&mut tx, credit).await?;
        }

        tx.commit().await?;
        Ok(Some(decided))
    }
}
