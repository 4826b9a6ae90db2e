//! # Catalog Core
//!
//! Storage-agnostic engine of the content catalog: data model, store
//! abstraction, stats ledger, single-kind queries, viewer state, and
//! cross-type aggregation.
//!
//! This crate contains no tokio runtime, sqlx, or filesystem I/O. Durable
//! state is reached only through the [`store::Store`] trait; the SQLite
//! implementation lives in the application crate and
//! [`store::memory::InMemoryStore`] backs the tests.

pub mod aggregate;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod models;
pub mod page;
pub mod sort;
pub mod store;
pub mod viewer;

#[cfg(test)]
mod test_support;
