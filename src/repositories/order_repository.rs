use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument, Instrument};

use crate::models::{
    NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, RepositoryError, RepositoryResult,
};

/// Trait defining the interface for order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order header and its lines as a single transaction,
    /// returning the generated order id. On any failure nothing is
    /// committed, so no partial order becomes retrievable.
    async fn create_order(&self, order: &NewOrder, lines: &[NewOrderLine])
        -> RepositoryResult<i64>;

    /// Fetch an order header by id
    async fn find_order(&self, id: i64) -> RepositoryResult<Option<Order>>;

    /// Fetch the lines belonging to an order
    async fn find_order_lines(&self, order_id: i64) -> RepositoryResult<Vec<OrderLine>>;
}

/// Postgres implementation of the OrderRepository trait
pub struct PgOrderRepository {
    pool: PgPool,
}

/// Raw order row; the status column is free text in storage and is parsed
/// into `OrderStatus` at this boundary.
#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    delivery_address: String,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus =
            row.status
                .parse()
                .map_err(|message: String| RepositoryError::InvalidRow { message })?;

        Ok(Order {
            id: row.id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            delivery_address: row.delivery_address,
            total_amount: row.total_amount,
            status,
            created_at: row.created_at,
        })
    }
}

impl PgOrderRepository {
    /// Create a new Postgres order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a database client span for an order query
    fn query_span(&self, operation: &str, table: &str) -> tracing::Span {
        tracing::info_span!(
            "Postgres",
            "otel.kind" = "client",
            "otel.name" = format!("{} {}", operation, table),
            "db.system" = "postgresql",
            "db.operation" = operation,
            "db.sql.table" = table,
        )
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    #[instrument(skip(self, order, lines), fields(line_count = lines.len()))]
    async fn create_order(
        &self,
        order: &NewOrder,
        lines: &[NewOrderLine],
    ) -> RepositoryResult<i64> {
        info!("Persisting order");

        let span = self.query_span("INSERT", "orders");

        let order_id = async {
            let mut tx = self.pool.begin().await?;

            let order_id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO orders \
                 (customer_name, customer_email, customer_phone, delivery_address, total_amount, status) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
            )
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(&order.customer_phone)
            .bind(&order.delivery_address)
            .bind(order.total_amount)
            .bind(order.status.to_string())
            .fetch_one(&mut *tx)
            .await?;

            for line in lines {
                sqlx::query(
                    "INSERT INTO order_items (order_id, menu_item_id, quantity, unit_price) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(order_id)
                .bind(line.menu_item_id)
                .bind(line.quantity)
                .bind(line.unit_price)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok::<i64, sqlx::Error>(order_id)
        }
        .instrument(span)
        .await?;

        info!(order_id, "Order persisted");
        Ok(order_id)
    }

    #[instrument(skip(self), fields(order_id = id))]
    async fn find_order(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let span = self.query_span("SELECT", "orders");

        let row = async {
            sqlx::query_as::<_, OrderRow>(
                "SELECT id, customer_name, customer_email, customer_phone, delivery_address, \
                        total_amount, status, created_at \
                 FROM orders WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        row.map(Order::try_from).transpose()
    }

    #[instrument(skip(self), fields(order_id = order_id))]
    async fn find_order_lines(&self, order_id: i64) -> RepositoryResult<Vec<OrderLine>> {
        let span = self.query_span("SELECT", "order_items");

        let lines = async {
            sqlx::query_as::<_, OrderLine>(
                "SELECT id, order_id, menu_item_id, quantity, unit_price \
                 FROM order_items WHERE order_id = $1 ORDER BY id",
            )
            .bind(order_id)
            .fetch_all(&self.pool)
            .await
        }
        .instrument(span)
        .await?;

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_row_status_parsing() {
        let row = OrderRow {
            id: 7,
            customer_name: "Asha Rao".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "+91 98765 43210".to_string(),
            delivery_address: "12 MG Road".to_string(),
            total_amount: dec!(900),
            status: "pending".to_string(),
            created_at: Utc::now(),
        };

        let order = Order::try_from(row).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, dec!(900));
    }

    #[test]
    fn test_order_row_rejects_unknown_status() {
        let row = OrderRow {
            id: 7,
            customer_name: "Asha Rao".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "+91 98765 43210".to_string(),
            delivery_address: "12 MG Road".to_string(),
            total_amount: dec!(900),
            status: "teleported".to_string(),
            created_at: Utc::now(),
        };

        match Order::try_from(row).unwrap_err() {
            RepositoryError::InvalidRow { message } => {
                assert!(message.contains("teleported"));
            }
            other => panic!("Expected InvalidRow error, got {}", other),
        }
    }
}
