//! `stockroom-orders` — order domain.
//!
//! Owns the immutable `Order` record, its line items, the status lifecycle,
//! and the [`OrderStore`] persistence contract.

pub mod order;
pub mod store;

pub use order::{Order, OrderLine, OrderLineRequest, OrderStatus};
pub use store::OrderStore;
