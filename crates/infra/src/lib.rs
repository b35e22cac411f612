//! `stockroom-infra` — storage implementations.
//!
//! In-memory ledger and order store by default (tests/dev and small
//! deployments); Postgres-backed equivalents behind the `postgres` feature.

pub mod in_memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{InMemoryOrderStore, InMemoryProductLedger};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresOrderStore, PostgresProductLedger};
