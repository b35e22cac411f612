use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_core::{DomainError, DomainResult, MinorUnits, ProductId};
use stockroom_products::{NewProduct, Product, ProductLedger, ProductPatch};

use super::{db_i64, db_u64, map_sqlx_error};

/// Postgres-backed product ledger.
///
/// `reserve_and_decrement` runs a transaction that takes a `FOR UPDATE` row
/// lock on the product, so concurrent reservations on the same product are
/// serialized by the database while different products proceed in parallel.
#[derive(Debug, Clone)]
pub struct PostgresProductLedger {
    pool: Arc<PgPool>,
}

impl PostgresProductLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn product_from_row(row: &sqlx::postgres::PgRow) -> DomainResult<Product> {
        let price: i64 = row
            .try_get("price")
            .map_err(|e| map_sqlx_error("read product", e))?;
        let quantity: i64 = row
            .try_get("quantity")
            .map_err(|e| map_sqlx_error("read product", e))?;
        Ok(Product {
            id: ProductId::from_uuid(
                row.try_get("id")
                    .map_err(|e| map_sqlx_error("read product", e))?,
            ),
            name: row
                .try_get("name")
                .map_err(|e| map_sqlx_error("read product", e))?,
            description: row
                .try_get("description")
                .map_err(|e| map_sqlx_error("read product", e))?,
            price: db_u64("read product", price)?,
            quantity: db_u64("read product", quantity)?,
        })
    }
}

#[async_trait]
impl ProductLedger for PostgresProductLedger {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get(&self, id: ProductId) -> DomainResult<Product> {
        let row = sqlx::query(
            "SELECT id, name, description, price, quantity FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get product", e))?
        .ok_or(DomainError::NotFound)?;

        Self::product_from_row(&row)
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, description, price, quantity FROM products")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list products", e))?;

        rows.iter().map(Self::product_from_row).collect()
    }

    #[instrument(skip(self, new))]
    async fn create(&self, new: NewProduct) -> DomainResult<Product> {
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            description: new.description,
            price: new.price,
            quantity: new.quantity,
        };

        sqlx::query(
            "INSERT INTO products (id, name, description, price, quantity) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(db_i64("create product", product.price)?)
        .bind(db_i64("create product", product.quantity)?)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create product", e))?;

        Ok(product)
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    async fn update(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update product", e))?;

        let row = sqlx::query(
            "SELECT id, name, description, price, quantity FROM products \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update product", e))?
        .ok_or(DomainError::NotFound)?;

        let mut product = Self::product_from_row(&row)?;
        product.apply_patch(&patch);

        sqlx::query(
            "UPDATE products SET name = $2, description = $3, price = $4, quantity = $5 \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(db_i64("update product", product.price)?)
        .bind(db_i64("update product", product.quantity)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update product", e))?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete(&self, id: ProductId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete product", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn reserve_and_decrement(
        &self,
        id: ProductId,
        amount: u64,
    ) -> DomainResult<MinorUnits> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("reserve stock", e))?;

        // Row lock: concurrent reservations on this product queue here.
        let row = sqlx::query("SELECT price, quantity FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("reserve stock", e))?
            .ok_or(DomainError::NotFound)?;

        let price: i64 = row
            .try_get("price")
            .map_err(|e| map_sqlx_error("reserve stock", e))?;
        let quantity: i64 = row
            .try_get("quantity")
            .map_err(|e| map_sqlx_error("reserve stock", e))?;
        let available = db_u64("reserve stock", quantity)?;

        if available < amount {
            // Dropping the transaction rolls the lock back untouched.
            return Err(DomainError::insufficient_stock(id, amount, available));
        }

        sqlx::query("UPDATE products SET quantity = quantity - $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(db_i64("reserve stock", amount)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("reserve stock", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("reserve stock", e))?;

        db_u64("reserve stock", price)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn restock(&self, id: ProductId, amount: u64) -> DomainResult<()> {
        let result = sqlx::query("UPDATE products SET quantity = quantity + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(db_i64("restock", amount)?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("restock", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}
