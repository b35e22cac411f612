//! Postgres-backed storage (feature `postgres`).
//!
//! Three tables mirror the domain: `products`, `orders`, `order_lines`
//! (foreign-keyed to both). Stock reservation uses a `SELECT ... FOR UPDATE`
//! row lock so check-and-decrement is serialized per product at the database.

mod ledger;
mod orders;

pub use ledger::PostgresProductLedger;
pub use orders::PostgresOrderStore;

use sqlx::PgPool;

use stockroom_core::{DomainError, DomainResult};

/// Create the schema if it does not exist yet.
///
/// `order_lines.product_id` is `ON DELETE RESTRICT`: the database backs up
/// the fulfillment service's referential check on product deletion.
pub async fn ensure_schema(pool: &PgPool) -> DomainResult<()> {
    // One statement per call: the prepared-statement protocol takes a single
    // statement at a time.
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id          UUID PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price       BIGINT NOT NULL CHECK (price >= 0),
            quantity    BIGINT NOT NULL CHECK (quantity >= 0)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id         UUID PRIMARY KEY,
            status     TEXT NOT NULL,
            total      BIGINT NOT NULL CHECK (total >= 0),
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS order_lines (
            order_id   UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
            line_no    INT NOT NULL,
            product_id UUID NOT NULL REFERENCES products (id) ON DELETE RESTRICT,
            quantity   BIGINT NOT NULL CHECK (quantity > 0),
            unit_price BIGINT NOT NULL CHECK (unit_price >= 0),
            PRIMARY KEY (order_id, line_no)
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS order_lines_product_idx
            ON order_lines (product_id)
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

/// Map a sqlx failure to the domain error surface.
///
/// Foreign-key violations (`23503`) become `Conflict`; everything else is a
/// `Persistence` failure.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23503") {
            return DomainError::conflict(format!("{operation}: {}", db.message()));
        }
    }
    DomainError::persistence(format!("{operation}: {err}"))
}

pub(crate) fn db_u64(operation: &str, value: i64) -> DomainResult<u64> {
    u64::try_from(value)
        .map_err(|_| DomainError::persistence(format!("{operation}: negative value in column")))
}

pub(crate) fn db_i64(operation: &str, value: u64) -> DomainResult<i64> {
    i64::try_from(value)
        .map_err(|_| DomainError::validation(format!("{operation}: value exceeds storable range")))
}
