//! The connection wrapper (C3): one native handle, opened in the engine's
//! serialized threading mode and fitted with the pragmas the expansion's
//! [`DatabaseConfig`](crate::config::DatabaseConfig) asks for.
//!
//! Mirrors the teacher's habit of keeping the raw engine handle behind a
//! small wrapper type (`db::core` opens the pool's connections with the
//! pragmas the app needs) rather than exposing `rusqlite::Connection`
//! directly to callers.

use rusqlite::OpenFlags;

use crate::cache;
use crate::error::{CoreError, CoreResult};
use crate::row::Row;
use crate::value::Value;

/// One open native database handle plus its own statement cache.
pub struct Connection {
    inner: rusqlite::Connection,
}

impl Connection {
    /// Open `path`, set it to serialized threading mode, and apply the
    /// busy-timeout/journal-mode pragmas from config (§6 expansion table).
    pub fn open(
        path: &str,
        busy_timeout_ms: u32,
        journal_mode: &str,
        cache_capacity: usize,
    ) -> CoreResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let inner = rusqlite::Connection::open_with_flags(path, flags)?;
        inner.busy_timeout(std::time::Duration::from_millis(busy_timeout_ms as u64))?;
        inner.pragma_update(None, "journal_mode", journal_mode)?;
        cache::configure(&inner, cache_capacity);
        Ok(Connection { inner })
    }

    fn bind(params: &[Value]) -> Vec<&dyn rusqlite::ToSql> {
        params.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
    }

    /// Execute a statement that produces no rows, returning the affected-row
    /// count (discarded by callers per §4.8, kept here for completeness).
    pub fn execute(&self, sql: &str, params: &[Value]) -> CoreResult<usize> {
        let mut stmt = cache::get_or_prepare(&self.inner, sql)?;
        let bound = Self::bind(params);
        Ok(stmt.execute(bound.as_slice())?)
    }

    /// Run the same statement once per parameter set, reusing the cached
    /// compiled statement across the whole batch (§4.8 `execute_many`).
    pub fn execute_many(&self, sql: &str, param_sets: &[Vec<Value>]) -> CoreResult<()> {
        let mut stmt = cache::get_or_prepare(&self.inner, sql)?;
        for params in param_sets {
            let bound = Self::bind(params);
            stmt.execute(bound.as_slice())?;
        }
        Ok(())
    }

    pub fn fetch_all(&self, sql: &str, params: &[Value]) -> CoreResult<Vec<Row>> {
        let mut stmt = cache::get_or_prepare(&self.inner, sql)?;
        let column_count = stmt.column_count();
        let bound = Self::bind(params);
        let mut rows_cursor = stmt.query(bound.as_slice())?;
        let mut out = Vec::new();
        while let Some(row) = rows_cursor.next()? {
            out.push(Row::from_sqlite_row(&row, column_count)?);
        }
        Ok(out)
    }

    pub fn fetch_one(&self, sql: &str, params: &[Value]) -> CoreResult<Row> {
        self.fetch_optional(sql, params)?.ok_or(CoreError::NoRow)
    }

    pub fn fetch_optional(&self, sql: &str, params: &[Value]) -> CoreResult<Option<Row>> {
        let mut stmt = cache::get_or_prepare(&self.inner, sql)?;
        let column_count = stmt.column_count();
        let bound = Self::bind(params);
        let mut rows_cursor = stmt.query(bound.as_slice())?;
        Ok(match rows_cursor.next()? {
            Some(row) => Some(Row::from_sqlite_row(&row, column_count)?),
            None => None,
        })
    }

    pub fn begin(&self) -> CoreResult<()> {
        self.inner.execute_batch("BEGIN")?;
        Ok(())
    }

    pub fn commit(&self) -> CoreResult<()> {
        self.inner.execute_batch("COMMIT")?;
        Ok(())
    }

    pub fn rollback(&self) -> CoreResult<()> {
        self.inner.execute_batch("ROLLBACK")?;
        Ok(())
    }

    pub fn set_pragma(&self, name: &str, value: &str) -> CoreResult<()> {
        self.inner.pragma_update(None, name, value)?;
        Ok(())
    }

    /// Finalize the statement cache and drop the underlying handle. Called
    /// when the pool closes an idle connection during drain.
    pub fn close(self) {
        cache::clear(&self.inner);
        // `rusqlite::Connection`'s `Drop` finalizes the handle itself.
    }
}
