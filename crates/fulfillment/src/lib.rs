//! `stockroom-fulfillment` — the order assembler.
//!
//! Coordinates the product ledger and the order store: multi-line stock
//! reservation, exact total computation, all-or-nothing persistence, and
//! compensating rollback when any step fails.

pub mod assembler;

pub use assembler::FulfillmentService;
