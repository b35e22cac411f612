//! Order assembly: validate, reserve, commit — or roll everything back.
//!
//! A `create_order` call moves through Validating → Reserving (line by line,
//! in request order) → Committing. A failure at any reserving or committing
//! step transitions to RollingBack: every prior decrement of this attempt is
//! compensated with a `restock` before the error is surfaced, so the ledger
//! never shows stock consumed by an order that does not exist.

use std::sync::Arc;

use chrono::Utc;

use stockroom_core::{DomainError, DomainResult, ProductId};
use stockroom_orders::{Order, OrderLine, OrderLineRequest, OrderStore};
use stockroom_products::ProductLedger;

/// The one component that sees both the ledger and the order store.
///
/// Owns the two cross-store behaviors: all-or-nothing order creation and the
/// referential-integrity check on product deletion.
pub struct FulfillmentService {
    ledger: Arc<dyn ProductLedger>,
    orders: Arc<dyn OrderStore>,
}

impl FulfillmentService {
    pub fn new(ledger: Arc<dyn ProductLedger>, orders: Arc<dyn OrderStore>) -> Self {
        Self { ledger, orders }
    }

    /// Assemble and persist an order, all-or-nothing.
    ///
    /// Reserves stock per line in request order; any failure (missing
    /// product, shortfall, or a persistence error after reservation) undoes
    /// every decrement already applied by this call and surfaces the failing
    /// line's error. On success the persisted order carries unit prices
    /// snapshotted at reservation time and status `pending`.
    pub async fn create_order(&self, requests: Vec<OrderLineRequest>) -> DomainResult<Order> {
        if requests.is_empty() {
            return Err(DomainError::validation("order must contain at least one line"));
        }
        for request in &requests {
            if request.quantity == 0 {
                return Err(DomainError::validation("line quantity must be positive"));
            }
        }

        let mut reserved: Vec<(ProductId, u64)> = Vec::with_capacity(requests.len());
        let mut lines: Vec<OrderLine> = Vec::with_capacity(requests.len());

        for request in &requests {
            match self
                .ledger
                .reserve_and_decrement(request.product_id, request.quantity)
                .await
            {
                Ok(unit_price) => {
                    reserved.push((request.product_id, request.quantity));
                    lines.push(OrderLine {
                        product_id: request.product_id,
                        quantity: request.quantity,
                        unit_price,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        product_id = %request.product_id,
                        reserved_lines = reserved.len(),
                        error = %err,
                        "reservation failed, rolling back"
                    );
                    self.roll_back(&reserved).await;
                    return Err(err);
                }
            }
        }

        let order = match Order::assemble(lines, Utc::now()) {
            Ok(order) => order,
            Err(err) => {
                self.roll_back(&reserved).await;
                return Err(err);
            }
        };

        match self.orders.save(order).await {
            Ok(saved) => {
                tracing::info!(
                    order_id = %saved.id,
                    total = saved.total,
                    lines = saved.lines.len(),
                    "order created"
                );
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!(error = %err, "order persistence failed, rolling back");
                self.roll_back(&reserved).await;
                Err(err)
            }
        }
    }

    /// Delete a product unless an existing order line references it.
    pub async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        if self.orders.references_product(id).await? {
            return Err(DomainError::conflict(format!(
                "product {id} is referenced by existing order lines"
            )));
        }
        self.ledger.delete(id).await
    }

    /// Compensate already-applied decrements, most recent first.
    ///
    /// A restock failure here cannot abort the remaining compensations; it is
    /// logged and the rest of the ledger is still restored.
    async fn roll_back(&self, reserved: &[(ProductId, u64)]) {
        for &(product_id, amount) in reserved.iter().rev() {
            if let Err(err) = self.ledger.restock(product_id, amount).await {
                tracing::error!(
                    product_id = %product_id,
                    amount,
                    error = %err,
                    "compensating restock failed, ledger may undercount this product"
                );
            }
        }
    }
}
