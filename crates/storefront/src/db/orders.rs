//! Order repository.
//!
//! Orders are always written whole: items are snapshotted as JSONB when the
//! draft is created and never re-joined against live product data.

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use graphica_core::records::{ORDER_COLUMNS, OrderRecord};
use graphica_core::{CustomerId, Order, OrderId, OrderTransitionError, Transition};

use super::{RepositoryError, convert_all};

/// Failure applying a transition to a stored order.
#[derive(Debug, Error)]
pub enum OrderUpdateError {
    #[error("order not found")]
    NotFound,
    #[error("transition rejected: {0}")]
    Rejected(#[from] OrderTransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a draft order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is taken.
    pub async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO orders (id, customer_id, items, total_amount, status, ordered_at,
                                created_at, payment_session_id, payment_status,
                                customer_name, customer_email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(&order.id)
        .bind(&order.customer_id)
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(order.status.map(|s| s.as_str()))
        .bind(order.ordered_at)
        .bind(order.created_at)
        .bind(order.payment_session_id.as_deref())
        .bind(order.payment_status.as_deref())
        .bind(order.customer_name.as_deref())
        .bind(order.customer_email.as_ref().map(|e| e.as_str()))
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("order {} already exists", order.id));
            }
            RepositoryError::Database(e)
        })?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRecord> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        row.map(Order::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    /// A single order, only if it belongs to `customer` and is not a draft.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_customer(
        &self,
        customer: &CustomerId,
        id: &OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRecord> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE id = $1 AND customer_id = $2 AND status IS NOT NULL"
        ))
        .bind(id)
        .bind(customer)
        .fetch_optional(self.pool)
        .await?;
        row.map(Order::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    /// A customer's orders, newest first. Unpaid drafts are not listed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRecord> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE customer_id = $1 AND status IS NOT NULL
             ORDER BY ordered_at DESC NULLS LAST, created_at DESC"
        ))
        .bind(customer)
        .fetch_all(self.pool)
        .await?;
        convert_all(rows)
    }

    /// Apply a transition under a row lock and persist the result.
    ///
    /// Concurrent deliveries for the same order serialize on the lock; a
    /// rejected transition leaves the stored order untouched.
    ///
    /// # Errors
    ///
    /// Returns `OrderUpdateError::NotFound` if no order has `id`, or
    /// `OrderUpdateError::Rejected` if the order refuses the transition.
    pub async fn apply(
        &self,
        id: &OrderId,
        transition: Transition,
    ) -> Result<Order, OrderUpdateError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let row: Option<OrderRecord> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let mut order = Order::try_from(row.ok_or(OrderUpdateError::NotFound)?)
            .map_err(RepositoryError::from)?;
        order.apply(transition)?;

        save(&mut tx, &order).await?;
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(order)
    }
}

/// Overwrite the mutable fields of an order. Items are never rewritten.
async fn save(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE orders
        SET total_amount = $2, status = $3, ordered_at = $4, payment_session_id = $5,
            payment_status = $6, customer_name = $7, customer_email = $8
        WHERE id = $1
        ",
    )
    .bind(&order.id)
    .bind(order.total_amount)
    .bind(order.status.map(|s| s.as_str()))
    .bind(order.ordered_at)
    .bind(order.payment_session_id.as_deref())
    .bind(order.payment_status.as_deref())
    .bind(order.customer_name.as_deref())
    .bind(order.customer_email.as_ref().map(|e| e.as_str()))
    .execute(&mut **tx)
    .await?;
    Ok(())
}
