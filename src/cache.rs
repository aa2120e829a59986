//! The per-connection statement cache (C2): a strict LRU keyed on the exact
//! SQL text, so a connection never recompiles a statement it has already
//! seen.
//!
//! `rusqlite::Connection` already carries an internal LRU cache of prepared
//! statements (`prepare_cached`/`CachedStatement`) with exactly the lifecycle
//! the spec calls for: a hit returns a statement reset with cleared
//! bindings, and on drop the statement resets again and returns to the
//! cache, or is finalized if the reset fails. Re-deriving that machinery by
//! hand would mean a `Statement<'conn>` stored next to the `Connection` that
//! produced it — a self-borrow safe Rust can't express without unsafe code
//! the teacher pack never reaches for. So C2 is a thin policy wrapper over
//! the engine's own cache rather than a reimplementation of it.

use rusqlite::{CachedStatement, Connection};

use crate::error::CoreResult;

/// Default capacity, per §4.2's recommendation.
pub const DEFAULT_CAPACITY: usize = 128;

/// Install the cache capacity on a freshly opened connection. Exact SQL-text
/// keying and strict-LRU eviction are both `rusqlite`'s own behavior here.
pub fn configure(conn: &Connection, capacity: usize) {
    conn.set_prepared_statement_cache_capacity(capacity);
}

/// Look up or compile `sql` against `conn`'s cache. The returned guard resets
/// its bindings on drop and returns itself to the cache, per §4.2 — unless
/// the reset fails, in which case `rusqlite` finalizes it instead of caching
/// it, matching "errors during reset mark the entry invalid and evict it
/// immediately".
pub fn get_or_prepare<'conn>(conn: &'conn Connection, sql: &str) -> CoreResult<CachedStatement<'conn>> {
    Ok(conn.prepare_cached(sql)?)
}

/// Finalize every cached statement. Called when the owning connection is
/// drained or returned permanently to idle-on-close, per §4.2.
pub fn clear(conn: &Connection) {
    conn.flush_prepared_statement_cache();
}
