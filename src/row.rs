//! The row materializer (C8): turns a stepped statement's current row into
//! an owned, positional sequence of [`Value`](crate::value::Value)s that can
//! outlive the statement and cross the worker → dispatcher boundary.

use rusqlite::Row as SqliteRow;

use crate::value::Value;

/// One materialized row: a positional sequence of values, decoded eagerly so
/// it owns no borrow into the statement that produced it.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn from_sqlite_row(row: &SqliteRow<'_>, column_count: usize) -> rusqlite::Result<Self> {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(row.get::<usize, Value>(idx)?);
        }
        Ok(Row { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        &self.values[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn materializes_positional_values() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, v TEXT); INSERT INTO t VALUES (1, 'a');",
        )
        .unwrap();

        let mut stmt = conn.prepare("SELECT id, v FROM t").unwrap();
        let mut rows = stmt.query([]).unwrap();
        let sqlite_row = rows.next().unwrap().unwrap();
        let row = Row::from_sqlite_row(&sqlite_row, 2).unwrap();

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&Value::Integer(1)));
        assert_eq!(row.get(1), Some(&Value::Text("a".to_string())));
    }
}
