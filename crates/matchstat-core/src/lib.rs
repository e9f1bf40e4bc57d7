//! Core types and trait definitions for match-statistics ingestion.
//!
//! This crate is deliberately free of HTML and database dependencies. It
//! holds the canonical field registry, the schema-version signatures, the
//! record model, and the store traits implemented by storage backends.

pub mod error;
pub mod field;
pub mod identity;
pub mod ids;
pub mod record;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
