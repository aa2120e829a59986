//! Truly-asynchronous SQLite binding core: a connection pool, an offload
//! dispatcher onto a fixed worker-thread pool, a per-connection statement
//! cache, and a transaction state machine, wired together behind a single
//! `Database` handle.
//!
//! See `SPEC_FULL.md` in the repo root for the full component design; this
//! module just wires the pieces (C1–C8) together behind the public types
//! re-exported below.

mod cache;
mod config;
mod connection;
mod cursor;
mod database;
mod dispatcher;
mod error;
mod job;
mod pool;
mod row;
mod transaction;
mod value;
mod worker;

pub use config::{ConfigError, DatabaseConfig, LogConfig};
pub use cursor::Cursor;
pub use database::{Database, Transaction};
pub use error::{CoreError, CoreResult};
pub use row::Row;
pub use value::{integer_from_i128, text_from_bytes, Value};

/// Install a `tracing` subscriber from a [`LogConfig`]. Re-exported at the
/// crate root since it's the one piece of ambient setup callers run before
/// touching a `Database` at all.
pub fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
    config::init_logging(log)
}
