//! In-memory storage.
//!
//! Intended for tests/dev and single-process deployments. Not optimized for
//! performance.

mod ledger;
mod orders;

pub use ledger::InMemoryProductLedger;
pub use orders::InMemoryOrderStore;
