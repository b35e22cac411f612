//! Product Ledger contract.
//!
//! The ledger is the authoritative record of per-product stock. Storage
//! backends implement this trait; callers never read-then-write quantities
//! themselves.

use async_trait::async_trait;

use stockroom_core::{DomainResult, MinorUnits, ProductId};

use crate::product::{NewProduct, Product, ProductPatch};

/// Authoritative store of products and their on-hand stock.
#[async_trait]
pub trait ProductLedger: Send + Sync {
    /// Fetch one product. `NotFound` if absent.
    async fn get(&self, id: ProductId) -> DomainResult<Product>;

    /// Snapshot of all products, order unspecified.
    async fn list(&self) -> DomainResult<Vec<Product>>;

    /// Store a new product under a fresh identifier.
    async fn create(&self, new: NewProduct) -> DomainResult<Product>;

    /// Apply a partial update. `NotFound` if absent.
    async fn update(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product>;

    /// Remove a product. `NotFound` if absent.
    ///
    /// Referential integrity against order lines is enforced one level up,
    /// by the fulfillment service, which is the only component that sees
    /// both the ledger and the order store.
    async fn delete(&self, id: ProductId) -> DomainResult<()>;

    /// Atomically check `quantity >= amount`, decrement, and return the
    /// current unit price.
    ///
    /// Linearizable per product: of two concurrent reservations against the
    /// last unit, exactly one succeeds; the other gets `InsufficientStock`
    /// and the quantity is untouched.
    async fn reserve_and_decrement(&self, id: ProductId, amount: u64)
    -> DomainResult<MinorUnits>;

    /// Increment stock. Used for deliveries and for compensating rollback
    /// of a failed multi-line reservation. Saturates instead of overflowing.
    async fn restock(&self, id: ProductId, amount: u64) -> DomainResult<()>;
}
