//! Service wiring: storage backends + the fulfillment service.

use std::sync::Arc;

use stockroom_fulfillment::FulfillmentService;
use stockroom_infra::{InMemoryOrderStore, InMemoryProductLedger};
use stockroom_orders::OrderStore;
use stockroom_products::ProductLedger;

/// Shared application services, injected into handlers via `Extension`.
pub struct AppServices {
    pub ledger: Arc<dyn ProductLedger>,
    pub orders: Arc<dyn OrderStore>,
    pub fulfillment: FulfillmentService,
}

/// Wire the default (in-memory) backends.
///
/// A Postgres deployment swaps the two `Arc::new(...)` lines for the
/// `stockroom-infra` `postgres` implementations; everything downstream is
/// trait-typed.
pub fn build_services() -> AppServices {
    let ledger: Arc<dyn ProductLedger> = Arc::new(InMemoryProductLedger::new());
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
    let fulfillment = FulfillmentService::new(Arc::clone(&ledger), Arc::clone(&orders));

    AppServices {
        ledger,
        orders,
        fulfillment,
    }
}
