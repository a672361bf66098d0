//! Payment intent repository.
//!
//! A payment intent is the durable transaction-id -> user binding written
//! at initiation time. It lets the asynchronous callback resolve the
//! paying user without trusting the buyer email in the callback payload;
//! email match remains a fallback for guest-initiated transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use vastra_core::{TxnId, UserId};

use super::RepositoryError;

/// A recorded payment initiation.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// The generated transaction id.
    pub txn_id: TxnId,
    /// The initiating user, when the request carried a session.
    pub user_id: Option<UserId>,
    /// The amount the buyer was quoted (raw value signed into the digest).
    pub amount: Decimal,
    /// Buyer email from the initiation form.
    pub buyer_email: String,
    /// When the transaction was initiated.
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PaymentIntentRow {
    txn_id: String,
    user_id: Option<i32>,
    amount: Decimal,
    buyer_email: String,
    created_at: DateTime<Utc>,
}

impl From<PaymentIntentRow> for PaymentIntent {
    fn from(row: PaymentIntentRow) -> Self {
        Self {
            txn_id: TxnId::new(row.txn_id),
            user_id: row.user_id.map(UserId::new),
            amount: row.amount,
            buyer_email: row.buyer_email,
            created_at: row.created_at,
        }
    }
}

/// Repository for payment intent database operations.
pub struct PaymentIntentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentIntentRepository<'a> {
    /// Create a new payment intent repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a newly initiated transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the transaction id already
    /// exists (the generator collided, which should never happen).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        txn_id: &TxnId,
        user_id: Option<UserId>,
        amount: Decimal,
        buyer_email: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO payment_intents (txn_id, user_id, amount, buyer_email)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(txn_id.as_str())
        .bind(user_id.map(|u| u.as_i32()))
        .bind(amount)
        .bind(buyer_email)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("duplicate txn id {txn_id}"));
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Look up the intent recorded for a transaction id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_txn_id(
        &self,
        txn_id: &TxnId,
    ) -> Result<Option<PaymentIntent>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentIntentRow>(
            r"
            SELECT txn_id, user_id, amount, buyer_email, created_at
            FROM payment_intents
            WHERE txn_id = $1
            ",
        )
        .bind(txn_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(PaymentIntent::from))
    }
}
