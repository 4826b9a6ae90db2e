//! # Content Catalog
//!
//! A catalog of posts and videos with per-item view and like counters,
//! per-viewer liked state, filtered listings, cross-type search, and
//! related content.
//!
//! The engine lives in the `catalog-core` crate and reaches storage only
//! through its `Store` trait. This crate supplies the SQLite store, schema
//! migrations, fixture seeding, and the two frontends (CLI and HTTP).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐
//! │   CLI    │   │   HTTP   │
//! │(catalog) │   │  (axum)  │
//! └────┬─────┘   └────┬─────┘
//!      └──────┬───────┘
//!             ▼
//!     ┌───────────────┐     ┌──────────┐
//!     │ CatalogService│────▶│  SQLite   │
//!     │ (catalog-core)│     │  (sqlx)   │
//!     └───────────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catalog init                          # create database
//! catalog seed ./fixtures/demo.json     # load sample content
//! catalog list videos --sort newest
//! catalog like posts 42 --user 7
//! catalog serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `Store` implementation |
//! | [`service`] | Engine wiring shared by the frontends |
//! | [`seed`] | JSON fixture loading |
//! | [`stats`] | Counters summary |
//! | [`commands`] | CLI query commands |
//! | [`server`] | HTTP server |

pub mod commands;
pub mod config;
pub mod db;
pub mod migrate;
pub mod seed;
pub mod server;
pub mod service;
pub mod sqlite_store;
pub mod stats;
