use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_core::{DomainError, DomainResult, OrderId, ProductId};
use stockroom_orders::{Order, OrderLine, OrderStatus, OrderStore};

use super::{db_i64, db_u64, map_sqlx_error};

/// Postgres-backed order store.
///
/// `save` writes the order header and every line inside one transaction, so
/// readers never see a half-written order.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn line_from_row(row: &sqlx::postgres::PgRow) -> DomainResult<OrderLine> {
        let quantity: i64 = row
            .try_get("quantity")
            .map_err(|e| map_sqlx_error("read order line", e))?;
        let unit_price: i64 = row
            .try_get("unit_price")
            .map_err(|e| map_sqlx_error("read order line", e))?;
        Ok(OrderLine {
            product_id: ProductId::from_uuid(
                row.try_get("product_id")
                    .map_err(|e| map_sqlx_error("read order line", e))?,
            ),
            quantity: db_u64("read order line", quantity)?,
            unit_price: db_u64("read order line", unit_price)?,
        })
    }

    fn header_from_row(row: &sqlx::postgres::PgRow) -> DomainResult<(OrderId, Order)> {
        let id = OrderId::from_uuid(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("read order", e))?,
        );
        let status: String = row
            .try_get("status")
            .map_err(|e| map_sqlx_error("read order", e))?;
        let status: OrderStatus = status
            .parse()
            .map_err(|_| DomainError::persistence(format!("unknown stored status '{status}'")))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("read order", e))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| map_sqlx_error("read order", e))?;
        Ok((
            id,
            Order {
                id,
                status,
                total: db_u64("read order", total)?,
                created_at,
                lines: Vec::new(),
            },
        ))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self, order), fields(order_id = %order.id, lines = order.lines.len()))]
    async fn save(&self, order: Order) -> DomainResult<Order> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("save order", e))?;

        sqlx::query("INSERT INTO orders (id, status, total, created_at) VALUES ($1, $2, $3, $4)")
            .bind(order.id.as_uuid())
            .bind(order.status.as_str())
            .bind(db_i64("save order", order.total)?)
            .bind(order.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("save order", e))?;

        for (line_no, line) in order.lines.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_lines (order_id, line_no, product_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id.as_uuid())
            .bind(line_no as i32)
            .bind(line.product_id.as_uuid())
            .bind(db_i64("save order", line.quantity)?)
            .bind(db_i64("save order", line.unit_price)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("save order", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("save order", e))?;

        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get(&self, id: OrderId) -> DomainResult<Order> {
        let row = sqlx::query("SELECT id, status, total, created_at FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get order", e))?
            .ok_or(DomainError::NotFound)?;

        let (_, mut order) = Self::header_from_row(&row)?;

        let line_rows = sqlx::query(
            "SELECT product_id, quantity, unit_price FROM order_lines \
             WHERE order_id = $1 ORDER BY line_no ASC",
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get order", e))?;

        order.lines = line_rows
            .iter()
            .map(Self::line_from_row)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(order)
    }

    async fn list(&self) -> DomainResult<Vec<Order>> {
        let rows = sqlx::query("SELECT id, status, total, created_at FROM orders")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list orders", e))?;

        let mut orders: HashMap<OrderId, Order> = HashMap::with_capacity(rows.len());
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let (id, order) = Self::header_from_row(row)?;
            ids.push(id);
            orders.insert(id, order);
        }

        let line_rows = sqlx::query(
            "SELECT order_id, product_id, quantity, unit_price FROM order_lines \
             ORDER BY order_id, line_no ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list orders", e))?;

        for row in &line_rows {
            let order_id = OrderId::from_uuid(
                row.try_get("order_id")
                    .map_err(|e| map_sqlx_error("list orders", e))?,
            );
            if let Some(order) = orders.get_mut(&order_id) {
                order.lines.push(Self::line_from_row(row)?);
            }
        }

        Ok(ids.into_iter().filter_map(|id| orders.remove(&id)).collect())
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> DomainResult<Order> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update status", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        self.get(id).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn references_product(&self, product_id: ProductId) -> DomainResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM order_lines WHERE product_id = $1) AS referenced",
        )
        .bind(product_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("references product", e))?;

        row.try_get("referenced")
            .map_err(|e| map_sqlx_error("references product", e))
    }
}
