//! `stockroom-products` — product catalog domain.
//!
//! Owns the `Product` entity, validated creation/update inputs, and the
//! [`ProductLedger`] contract that storage implementations fulfil.

pub mod ledger;
pub mod product;

pub use ledger::ProductLedger;
pub use product::{NewProduct, Product, ProductPatch};
