//! `Database`: the crate's single public entry point (§4.9). It owns the
//! lazily-constructed pool (C6), the transaction controller (C7), and the
//! dispatcher/worker pool (C5/C4), and exposes exactly the operations §6
//! lists as inherent async methods — no separate façade type, the way the
//! teacher's own `Db` handle is itself what `app` code calls into directly
//! rather than going through another indirection layer.

use std::path::PathBuf;
use std::sync::{Mutex as StdMutex, OnceLock};
use std::time::Duration;

use crate::config::{ConfigError, DatabaseConfig};
use crate::cursor::Cursor;
use crate::dispatcher::Dispatcher;
use crate::error::CoreResult;
use crate::job::{Operation, Outcome};
use crate::pool::{Pool, PoolConfig};
use crate::row::Row;
use crate::transaction::TransactionController;
use crate::value::Value;

struct Inner {
    /// The mutable front-of-house config. `pool_size`/`connection_timeout`
    /// setters write here; the pool and dispatcher only ever read a
    /// snapshot of it once, at first use (§4.6's "lazy construction").
    config: StdMutex<DatabaseConfig>,
    pool: OnceLock<Pool>,
    dispatcher: OnceLock<Dispatcher>,
    tx: TransactionController,
}

/// The crate's public surface. Cheap to clone — cloning shares the same
/// pool, dispatcher, and transaction state, which is what lets multiple
/// tasks cooperate on one logical database object (§8's concurrent
/// scenarios).
#[derive(Clone)]
pub struct Database {
    inner: std::sync::Arc<Inner>,
}

/// A handle produced by [`Database::transaction`]. Its lifecycle is driven
/// explicitly by calling `commit` or `rollback` — `Drop` cannot run async
/// code, so a guard dropped without either issues a best-effort rollback on
/// a spawned task instead of relying on synchronous unwind cleanup, mirroring
/// the teacher's preference for explicit lifecycle methods over `Drop` magic
/// for anything that touches I/O.
pub struct Transaction {
    db: Database,
    finished: bool,
}

impl Transaction {
    pub async fn commit(mut self) -> CoreResult<()> {
        self.finished = true;
        self.db.commit().await
    }

    pub async fn rollback(mut self) -> CoreResult<()> {
        self.finished = true;
        self.db.rollback().await
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            let db = self.db.clone();
            tokio::spawn(async move {
                tracing::warn!("transaction guard dropped without commit/rollback; rolling back");
                let _ = db.rollback().await;
            });
        }
    }
}

impl Database {
    /// Open (or create) the database file named in `config`. The pool and
    /// worker threads are not created yet — only on first use.
    pub fn open(config: DatabaseConfig) -> Self {
        Database {
            inner: std::sync::Arc::new(Inner {
                config: StdMutex::new(config),
                pool: OnceLock::new(),
                dispatcher: OnceLock::new(),
                tx: TransactionController::new(),
            }),
        }
    }

    fn pool(&self) -> &Pool {
        self.inner.pool.get_or_init(|| {
            let config = self.inner.config.lock().expect("config mutex poisoned").clone();
            Pool::new(PoolConfig {
                path: config.db_file.to_string_lossy().into_owned(),
                pool_size: config.resolved_pool_size(),
                connection_timeout: config.connection_timeout,
                busy_timeout_ms: config.busy_timeout_ms,
                journal_mode: config.journal_mode,
                cache_capacity: config.statement_cache_capacity,
            })
        })
    }

    fn dispatcher(&self) -> &Dispatcher {
        self.inner.dispatcher.get_or_init(|| {
            let pool_size = self
                .inner
                .config
                .lock()
                .expect("config mutex poisoned")
                .resolved_pool_size();
            Dispatcher::new(pool_size)
        })
    }

    async fn step(&self, op: Operation) -> CoreResult<Outcome> {
        self.inner
            .tx
            .step(self.pool(), self.dispatcher(), op)
            .await
    }

    pub async fn execute(&self, sql: &str, params: &[Value]) -> CoreResult<()> {
        self.step(Operation::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        })
        .await?;
        Ok(())
    }

    pub async fn execute_many(&self, sql: &str, param_sets: &[Vec<Value>]) -> CoreResult<()> {
        self.step(Operation::ExecuteMany {
            sql: sql.to_string(),
            param_sets: param_sets.to_vec(),
        })
        .await?;
        Ok(())
    }

    pub async fn fetch_all(&self, sql: &str, params: &[Value]) -> CoreResult<Vec<Row>> {
        match self
            .step(Operation::FetchAll {
                sql: sql.to_string(),
                params: params.to_vec(),
            })
            .await?
        {
            Outcome::Rows(rows) => Ok(rows),
            _ => unreachable!("FetchAll always yields Outcome::Rows"),
        }
    }

    pub async fn fetch_one(&self, sql: &str, params: &[Value]) -> CoreResult<Row> {
        match self
            .step(Operation::FetchOne {
                sql: sql.to_string(),
                params: params.to_vec(),
            })
            .await?
        {
            Outcome::Row(row) => Ok(row),
            _ => unreachable!("FetchOne always yields Outcome::Row"),
        }
    }

    pub async fn fetch_optional(&self, sql: &str, params: &[Value]) -> CoreResult<Option<Row>> {
        match self
            .step(Operation::FetchOptional {
                sql: sql.to_string(),
                params: params.to_vec(),
            })
            .await?
        {
            Outcome::OptionalRow(row) => Ok(row),
            _ => unreachable!("FetchOptional always yields Outcome::OptionalRow"),
        }
    }

    pub async fn set_pragma(&self, name: &str, value: &str) -> CoreResult<()> {
        self.step(Operation::SetPragma {
            name: name.to_string(),
            value: value.to_string(),
        })
        .await?;
        Ok(())
    }

    pub async fn begin(&self) -> CoreResult<()> {
        self.inner.tx.begin(self.pool(), self.dispatcher()).await
    }

    pub async fn commit(&self) -> CoreResult<()> {
        self.inner.tx.commit(self.pool(), self.dispatcher()).await
    }

    pub async fn rollback(&self) -> CoreResult<()> {
        self.inner.tx.rollback(self.pool(), self.dispatcher()).await
    }

    pub async fn in_transaction(&self) -> bool {
        self.inner.tx.in_transaction().await
    }

    /// A scoped transaction: already begun by the time this returns.
    pub async fn transaction(&self) -> CoreResult<Transaction> {
        self.begin().await?;
        Ok(Transaction {
            db: self.clone(),
            finished: false,
        })
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.clone())
    }

    /// Close all idle connections and wait for outstanding ones to come
    /// back, then close those too. Idempotent (§4.6).
    pub async fn drain(&self) {
        if let Some(pool) = self.inner.pool.get() {
            pool.drain().await;
        }
    }

    /// The configured pool capacity — `None` if never set. Before first use
    /// this reflects whatever the config currently says; after first use it
    /// reports the value the pool actually captured at construction (§4.6),
    /// which is always `Some`, since unset resolves to a default the moment
    /// the pool is built.
    pub fn pool_size(&self) -> Option<usize> {
        match self.inner.pool.get() {
            Some(pool) => Some(pool.capacity()),
            None => self.inner.config.lock().expect("config mutex poisoned").pool_size,
        }
    }

    pub fn set_pool_size(&self, value: Option<i64>) -> Result<(), ConfigError> {
        self.inner
            .config
            .lock()
            .expect("config mutex poisoned")
            .set_pool_size(value)
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        self.inner
            .config
            .lock()
            .expect("config mutex poisoned")
            .connection_timeout
    }

    pub fn set_connection_timeout(&self, seconds: Option<i64>) -> Result<(), ConfigError> {
        self.inner
            .config
            .lock()
            .expect("config mutex poisoned")
            .set_connection_timeout(seconds)
    }

    pub fn db_file(&self) -> PathBuf {
        self.inner.config.lock().expect("config mutex poisoned").db_file.clone()
    }
}
