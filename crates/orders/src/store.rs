//! Order Store contract.

use async_trait::async_trait;

use stockroom_core::{DomainResult, OrderId, ProductId};

use crate::order::{Order, OrderStatus};

/// Persistence for orders and their lines.
///
/// An order and its lines are saved together as one unit; a half-written
/// order is never observable through `get`/`list`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an assembled order. Returns the stored record.
    async fn save(&self, order: Order) -> DomainResult<Order>;

    /// Fetch one order including all lines. `NotFound` if absent.
    async fn get(&self, id: OrderId) -> DomainResult<Order>;

    /// Snapshot of all orders, order unspecified.
    async fn list(&self) -> DomainResult<Vec<Order>>;

    /// Replace the status and nothing else. Totals and lines are never
    /// recomputed here. `NotFound` if absent.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> DomainResult<Order>;

    /// Whether any stored order line references the product. Backs the
    /// referential-integrity check on product deletion.
    async fn references_product(&self, product_id: ProductId) -> DomainResult<bool>;
}
