//! `Cursor` (expansion, §4.9): a thin handle over a cloned [`Database`] that
//! additionally remembers its own last result set and a read position into
//! it, the way a classic DB-API cursor layers incremental row consumption on
//! top of a shared connection. It has no private connection of its own and
//! no transaction state beyond what `Database` already tracks.

use crate::database::Database;
use crate::error::CoreResult;
use crate::row::Row;
use crate::value::Value;

pub struct Cursor {
    db: Database,
    rows: Vec<Row>,
    position: usize,
}

impl Cursor {
    pub(crate) fn new(db: Database) -> Self {
        Cursor {
            db,
            rows: Vec::new(),
            position: 0,
        }
    }

    /// Run a statement that produces no rows; clears this cursor's cached
    /// result set.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> CoreResult<()> {
        self.db.execute(sql, params).await?;
        self.rows.clear();
        self.position = 0;
        Ok(())
    }

    pub async fn execute_many(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> CoreResult<()> {
        self.db.execute_many(sql, param_sets).await?;
        self.rows.clear();
        self.position = 0;
        Ok(())
    }

    /// Run `sql`, stash the full result set, and return it.
    pub async fn fetchall(&mut self, sql: &str, params: &[Value]) -> CoreResult<Vec<Row>> {
        let rows = self.db.fetch_all(sql, params).await?;
        self.rows = rows.clone();
        self.position = self.rows.len();
        Ok(rows)
    }

    /// Run `sql`, stash its single row, and return it.
    pub async fn fetchone(&mut self, sql: &str, params: &[Value]) -> CoreResult<Row> {
        let row = self.db.fetch_one(sql, params).await?;
        self.rows = vec![row.clone()];
        self.position = 1;
        Ok(row)
    }

    pub async fn fetch_optional(&mut self, sql: &str, params: &[Value]) -> CoreResult<Option<Row>> {
        let row = self.db.fetch_optional(sql, params).await?;
        self.rows = row.clone().into_iter().collect();
        self.position = self.rows.len();
        Ok(row)
    }

    /// Advance the cursor's read position over its own cached result set,
    /// without touching the engine. Returns `None` once exhausted.
    pub fn next_cached(&mut self) -> Option<&Row> {
        let row = self.rows.get(self.position)?;
        self.position += 1;
        Some(row)
    }

    /// The cursor's full cached result set from its last fetch, unconsumed.
    pub fn cached_rows(&self) -> &[Row] {
        &self.rows
    }
}
