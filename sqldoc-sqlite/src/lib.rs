//! SQLite backend implementation for sqldoc.
//!
//! This crate provides a SQLite-based implementation of the `StoreBackend` trait on
//! top of an `sqlx` connection pool. Collections are ordinary tables with a JSON
//! payload column, and queries run through SQLite's JSON functions.
//!
//! To use this backend, include the `sqlite` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqldoc = { version = "x.y.z", features = ["sqlite"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to a SQLite database file
//! - **Parameterized queries** - Filter values and limits are always bound, never spliced
//! - **Optimistic merges** - Conditional writes detect concurrent modifications
//!
//! # Example
//!
//! ```ignore
//! use sqldoc::{backend::StoreBackendBuilder, sqlite::SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::builder("sqlite://sqldoc.db?mode=rwc")
//!         .max_connections(10)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sqldoc_sqlite;

pub mod store;
pub mod query;

pub use store::{SqliteStore, SqliteStoreBuilder};
