use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use stockroom_core::{DomainError, DomainResult, MinorUnits, ProductId};
use stockroom_products::{NewProduct, Product, ProductLedger, ProductPatch};

/// In-memory product ledger.
///
/// Each product sits behind its own `Mutex`, so reservations on different
/// products proceed in parallel while `reserve_and_decrement` stays
/// linearizable per product. The outer `RwLock` guards only the map shape
/// (create/delete/list).
#[derive(Debug, Default)]
pub struct InMemoryProductLedger {
    products: RwLock<HashMap<ProductId, Arc<Mutex<Product>>>>,
}

impl InMemoryProductLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: ProductId) -> DomainResult<Arc<Mutex<Product>>> {
        let products = self
            .products
            .read()
            .map_err(|_| DomainError::persistence("product map lock poisoned"))?;
        products.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn lock_slot(slot: &Mutex<Product>) -> DomainResult<std::sync::MutexGuard<'_, Product>> {
        slot.lock()
            .map_err(|_| DomainError::persistence("product lock poisoned"))
    }
}

#[async_trait]
impl ProductLedger for InMemoryProductLedger {
    async fn get(&self, id: ProductId) -> DomainResult<Product> {
        let slot = self.slot(id)?;
        let product = Self::lock_slot(&slot)?;
        Ok(product.clone())
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| DomainError::persistence("product map lock poisoned"))?;
        let mut out = Vec::with_capacity(products.len());
        for slot in products.values() {
            out.push(Self::lock_slot(slot)?.clone());
        }
        Ok(out)
    }

    async fn create(&self, new: NewProduct) -> DomainResult<Product> {
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            description: new.description,
            price: new.price,
            quantity: new.quantity,
        };
        let mut products = self
            .products
            .write()
            .map_err(|_| DomainError::persistence("product map lock poisoned"))?;
        products.insert(product.id, Arc::new(Mutex::new(product.clone())));
        Ok(product)
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product> {
        let slot = self.slot(id)?;
        let mut product = Self::lock_slot(&slot)?;
        product.apply_patch(&patch);
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> DomainResult<()> {
        let mut products = self
            .products
            .write()
            .map_err(|_| DomainError::persistence("product map lock poisoned"))?;
        products.remove(&id).map(|_| ()).ok_or(DomainError::NotFound)
    }

    async fn reserve_and_decrement(
        &self,
        id: ProductId,
        amount: u64,
    ) -> DomainResult<MinorUnits> {
        let slot = self.slot(id)?;
        let mut product = Self::lock_slot(&slot)?;
        if product.quantity < amount {
            return Err(DomainError::insufficient_stock(
                id,
                amount,
                product.quantity,
            ));
        }
        product.quantity -= amount;
        Ok(product.price)
    }

    async fn restock(&self, id: ProductId, amount: u64) -> DomainResult<()> {
        let slot = self.slot(id)?;
        let mut product = Self::lock_slot(&slot)?;
        product.quantity = product.quantity.saturating_add(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_mouse(quantity: i64) -> NewProduct {
        NewProduct::new(
            "Mouse".to_string(),
            Some("Gaming mouse".to_string()),
            3000,
            quantity,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let ledger = InMemoryProductLedger::new();
        let created = ledger.create(new_mouse(5)).await.unwrap();
        let fetched = ledger.get(created.id).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let ledger = InMemoryProductLedger::new();
        let err = ledger.get(ProductId::new()).await.unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[tokio::test]
    async fn update_applies_partial_fields() {
        let ledger = InMemoryProductLedger::new();
        let created = ledger.create(new_mouse(5)).await.unwrap();
        let patch = ProductPatch::new(None, None, Some(3500), None).unwrap();
        let updated = ledger.update(created.id, patch).await.unwrap();
        assert_eq!(updated.price, 3500);
        assert_eq!(updated.name, "Mouse");
        assert_eq!(updated.quantity, 5);
    }

    #[tokio::test]
    async fn delete_removes_the_product() {
        let ledger = InMemoryProductLedger::new();
        let created = ledger.create(new_mouse(5)).await.unwrap();
        ledger.delete(created.id).await.unwrap();
        assert_eq!(ledger.get(created.id).await.unwrap_err(), DomainError::NotFound);
        assert_eq!(
            ledger.delete(created.id).await.unwrap_err(),
            DomainError::NotFound
        );
    }

    #[tokio::test]
    async fn reserve_decrements_and_returns_price() {
        let ledger = InMemoryProductLedger::new();
        let created = ledger.create(new_mouse(5)).await.unwrap();
        let price = ledger.reserve_and_decrement(created.id, 2).await.unwrap();
        assert_eq!(price, 3000);
        assert_eq!(ledger.get(created.id).await.unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn reserve_beyond_stock_fails_without_mutation() {
        let ledger = InMemoryProductLedger::new();
        let created = ledger.create(new_mouse(1)).await.unwrap();
        let err = ledger.reserve_and_decrement(created.id, 2).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::insufficient_stock(created.id, 2, 1)
        );
        assert_eq!(ledger.get(created.id).await.unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn restock_increments_and_saturates() {
        let ledger = InMemoryProductLedger::new();
        let created = ledger.create(new_mouse(1)).await.unwrap();
        ledger.restock(created.id, 4).await.unwrap();
        assert_eq!(ledger.get(created.id).await.unwrap().quantity, 5);

        ledger.restock(created.id, u64::MAX).await.unwrap();
        assert_eq!(ledger.get(created.id).await.unwrap().quantity, u64::MAX);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_reservations_never_oversell() {
        let ledger = Arc::new(InMemoryProductLedger::new());
        let created = ledger.create(new_mouse(100)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            let id = created.id;
            handles.push(tokio::spawn(async move {
                let mut won = 0u64;
                for _ in 0..50 {
                    if ledger.reserve_and_decrement(id, 1).await.is_ok() {
                        won += 1;
                    }
                }
                won
            }));
        }

        let mut total_won = 0u64;
        for h in handles {
            total_won += h.await.unwrap();
        }

        // 400 attempts against 100 units: exactly 100 can win.
        assert_eq!(total_won, 100);
        assert_eq!(ledger.get(created.id).await.unwrap().quantity, 0);
    }
}
