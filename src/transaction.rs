//! The transaction controller (C7): the IDLE/STARTING/ACTIVE/FINISHING
//! state machine from §4.7, guarded by a `tokio::sync::Mutex` so the guard
//! can be held across the suspension points inside `BEGIN`/`COMMIT`/
//! `ROLLBACK` submission.
//!
//! The spec is explicit that concurrent `begin()` calls must not queue —
//! only the first to observe IDLE wins, the rest fail immediately with
//! "already in progress" (§8: "exactly one succeeds synchronously"). A plain
//! `.lock().await` would queue every contender and let them all eventually
//! succeed in turn, which is what the *host* language's own test suite
//! originally asserted (see `test_concurrent_transactions.py`) but is not
//! what this spec's testable properties pin down. So `begin()` uses
//! `try_lock()` and fails fast on contention, while statement execution and
//! `commit`/`rollback` use the normal queueing `lock().await` — those really
//! are meant to serialize, not fail fast.

use tokio::sync::Mutex;
use tracing::debug;

use crate::connection::Connection;
use crate::dispatcher::{Dispatched, Dispatcher};
use crate::error::{CoreError, CoreResult};
use crate::job::{Operation, Outcome};
use crate::pool::Pool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Starting,
    Active,
    Finishing,
}

struct Inner {
    state: State,
    /// Present iff `state == Active`; the connection pinned for the
    /// duration of the transaction.
    conn: Option<Connection>,
}

pub struct TransactionController {
    inner: Mutex<Inner>,
}

impl TransactionController {
    pub fn new() -> Self {
        TransactionController {
            inner: Mutex::new(Inner {
                state: State::Idle,
                conn: None,
            }),
        }
    }

    pub async fn begin(&self, pool: &Pool, dispatcher: &Dispatcher) -> CoreResult<()> {
        let mut guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Err(CoreError::already_in_progress()),
        };

        if guard.state != State::Idle {
            return Err(CoreError::already_in_progress());
        }
        guard.state = State::Starting;

        let conn = pool.acquire().await?;
        match dispatcher.submit(conn, Operation::Begin).await {
            Dispatched::Completed {
                connection,
                result: Ok(_),
            } => {
                debug!("transaction: begin");
                guard.state = State::Active;
                guard.conn = Some(connection);
                Ok(())
            }
            Dispatched::Completed {
                connection,
                result: Err(err),
            } => {
                pool.release(connection);
                guard.state = State::Idle;
                Err(err)
            }
            Dispatched::ConnectionLost(err) => {
                pool.forget();
                guard.state = State::Idle;
                Err(err)
            }
        }
    }

    pub async fn commit(&self, pool: &Pool, dispatcher: &Dispatcher) -> CoreResult<()> {
        self.finish(pool, dispatcher, Operation::Commit).await
    }

    pub async fn rollback(&self, pool: &Pool, dispatcher: &Dispatcher) -> CoreResult<()> {
        self.finish(pool, dispatcher, Operation::Rollback).await
    }

    async fn finish(&self, pool: &Pool, dispatcher: &Dispatcher, op: Operation) -> CoreResult<()> {
        let mut guard = self.inner.lock().await;
        if guard.state != State::Active {
            return Err(CoreError::OperationalError(
                "no transaction in progress".to_string(),
            ));
        }
        guard.state = State::Finishing;
        let conn = guard
            .conn
            .take()
            .expect("active state always carries a connection");

        match dispatcher.submit(conn, op).await {
            Dispatched::Completed { connection, result } => {
                pool.release(connection);
                guard.state = State::Idle;
                result.map(|_| ())
            }
            Dispatched::ConnectionLost(err) => {
                pool.forget();
                guard.state = State::Idle;
                Err(err)
            }
        }
    }

    /// Route a statement: on the pinned connection while `Active`, ad hoc
    /// against a freshly acquired one otherwise (§4.7's table).
    pub async fn step(
        &self,
        pool: &Pool,
        dispatcher: &Dispatcher,
        op: Operation,
    ) -> CoreResult<Outcome> {
        let mut guard = self.inner.lock().await;
        if guard.state == State::Active {
            let conn = guard
                .conn
                .take()
                .expect("active state always carries a connection");
            match dispatcher.submit(conn, op).await {
                Dispatched::Completed { connection, result } => {
                    guard.conn = Some(connection);
                    result
                }
                Dispatched::ConnectionLost(err) => {
                    pool.forget();
                    guard.state = State::Idle;
                    Err(err)
                }
            }
        } else {
            drop(guard);
            let conn = pool.acquire().await?;
            match dispatcher.submit(conn, op).await {
                Dispatched::Completed { connection, result } => {
                    pool.release(connection);
                    result
                }
                Dispatched::ConnectionLost(err) => {
                    pool.forget();
                    Err(err)
                }
            }
        }
    }

    pub async fn in_transaction(&self) -> bool {
        self.inner.lock().await.state == State::Active
    }
}
