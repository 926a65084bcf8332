// db/ledgerdb.rs
use async_trait::async_trait;
use sqlx::Postgres;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::transactionmodel::{Transaction, TransactionStatus};

type PgTransaction<'c> = sqlx::Transaction<'c, Postgres>;

const TRANSACTION_COLUMNS: &str = r#"
    id, user_id, "type", amount, description, source, referral_id,
    reference_number, status, approved_by, created_at
"#;

#[async_trait]
pub trait LedgerExt {
    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction, sqlx::Error>;

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Option<Transaction>, sqlx::Error>;

    /// All entries, or one user's, newest first.
    async fn get_transactions(&self, user_id: Option<Uuid>) -> Result<Vec<Transaction>, sqlx::Error>;

    /// Moves an entry from `from` to `to`. Returns `None` when the entry is
    /// missing or no longer in `from`.
    async fn update_transaction_status(
        &self,
        transaction_id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
        approved_by: Option<String>,
    ) -> Result<Option<Transaction>, sqlx::Error>;

    /// Records a debit only if the user's approved total still covers it.
    async fn insert_debit(&self, debit: &Transaction) -> Result<Option<Transaction>, sqlx::Error>;

    /// Records a fair-use penalty only if the user's approved penalties still
    /// add up to `already_applied` points.
    async fn insert_penalty(
        &self,
        penalty: &Transaction,
        already_applied: i32,
    ) -> Result<Option<Transaction>, sqlx::Error>;
}

/// Serialises balance-dependent writes for one user until the transaction ends.
pub(super) async fn lock_user_in(
    tx: &mut PgTransaction<'_>,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(())
}

pub(super) async fn approved_total_in(
    tx: &mut PgTransaction<'_>,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(amount), 0)::BIGINT
        FROM transactions
        WHERE user_id = $1 AND status = 'approved'
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

pub(super) async fn insert_transaction_in(
    tx: &mut PgTransaction<'_>,
    transaction: &Transaction,
) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(&format!(
        r#"
        INSERT INTO transactions ({cols})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {cols}
        "#,
        cols = TRANSACTION_COLUMNS
    ))
    .bind(transaction.id)
    .bind(transaction.user_id)
    .bind(transaction.kind)
    .bind(transaction.amount)
    .bind(&transaction.description)
    .bind(transaction.source)
    .bind(transaction.referral_id)
    .bind(&transaction.reference_number)
    .bind(transaction.status)
    .bind(&transaction.approved_by)
    .bind(transaction.created_at)
    .fetch_one(&mut **tx)
    .await
}

pub(super) async fn set_transaction_status_in(
    tx: &mut PgTransaction<'_>,
    transaction_id: Uuid,
    status: TransactionStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE transactions SET status = $2 WHERE id = $1")
        .bind(transaction_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl LedgerExt for DBClient {
    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let inserted = insert_transaction_in(&mut tx, transaction).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_transactions(&self, user_id: Option<Uuid>) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_transaction_status(
        &self,
        transaction_id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
        approved_by: Option<String>,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET status = $3, approved_by = COALESCE($4, approved_by)
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .bind(from)
        .bind(to)
        .bind(approved_by)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_debit(&self, debit: &Transaction) -> Result<Option<Transaction>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        lock_user_in(&mut tx, debit.user_id).await?;
        let total = approved_total_in(&mut tx, debit.user_id).await?;
        if total + (debit.amount as i64) < 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = insert_transaction_in(&mut tx, debit).await?;
        tx.commit().await?;
        Ok(Some(inserted))
    }

    async fn insert_penalty(
        &self,
        penalty: &Transaction,
        already_applied: i32,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        lock_user_in(&mut tx, penalty.user_id).await?;
        let applied = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(-amount), 0)::BIGINT
            FROM transactions
            WHERE user_id = $1 AND source = 'fair_use_penalty' AND status = 'approved'
            "#,
        )
        .bind(penalty.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if applied != already_applied as i64 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = insert_transaction_in(&mut tx, penalty).await?;
        tx.commit().await?;
        Ok(Some(inserted))
    }
}
