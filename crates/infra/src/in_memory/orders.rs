use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stockroom_core::{DomainError, DomainResult, OrderId, ProductId};
use stockroom_orders::{Order, OrderStatus, OrderStore};

/// In-memory order store.
///
/// The whole order (header + lines) is inserted under one write lock, so a
/// half-written order is never observable.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, HashMap<OrderId, Order>>> {
        self.orders
            .read()
            .map_err(|_| DomainError::persistence("order map lock poisoned"))
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<OrderId, Order>>> {
        self.orders
            .write()
            .map_err(|_| DomainError::persistence("order map lock poisoned"))
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save(&self, order: Order) -> DomainResult<Order> {
        let mut orders = self.write()?;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> DomainResult<Order> {
        let orders = self.read()?;
        orders.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    async fn list(&self) -> DomainResult<Vec<Order>> {
        let orders = self.read()?;
        Ok(orders.values().cloned().collect())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> DomainResult<Order> {
        let mut orders = self.write()?;
        let order = orders.get_mut(&id).ok_or(DomainError::NotFound)?;
        order.status = status;
        Ok(order.clone())
    }

    async fn references_product(&self, product_id: ProductId) -> DomainResult<bool> {
        let orders = self.read()?;
        Ok(orders
            .values()
            .any(|o| o.lines.iter().any(|l| l.product_id == product_id)))
    }
}
