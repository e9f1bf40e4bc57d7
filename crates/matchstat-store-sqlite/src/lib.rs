//! SQLite backend for the matchstat reference and destination stores.
//!
//! One [`rusqlite::Connection`] guarded by a mutex; every record write runs in
//! an `IMMEDIATE` transaction so concurrent ingest processes serialise on the
//! database lock instead of interleaving partial writes.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
