//! The connection pool (C6): a bounded set of native handles shared across
//! tasks, built the way the pack's `sqlx-core` pool is (idle queue plus a
//! live count, grown lazily up to capacity, `Notify`-driven waiters) but
//! trimmed to exactly the operations §4.6 names — no min-idle reaper or
//! max-lifetime eviction, since nothing in the spec calls for them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::error::{CoreError, CoreResult};

/// Captured at pool-construction time, per §4.6's "lazy construction ...
/// captures current `pool_size` and `connection_timeout`".
pub struct PoolConfig {
    pub path: String,
    pub pool_size: usize,
    pub connection_timeout: Option<Duration>,
    pub busy_timeout_ms: u32,
    pub journal_mode: String,
    pub cache_capacity: usize,
}

struct PoolState {
    idle: VecDeque<Connection>,
    /// Connections either idle or checked out; always `<= capacity`.
    total: usize,
}

pub struct Pool {
    config: PoolConfig,
    state: StdMutex<PoolState>,
    notify: Notify,
    draining: AtomicBool,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Self {
        Pool {
            config,
            state: StdMutex::new(PoolState {
                idle: VecDeque::new(),
                total: 0,
            }),
            notify: Notify::new(),
            draining: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.pool_size
    }

    /// Acquire a connection, opening a fresh one if under capacity or
    /// waiting for a release otherwise. Bounded by `connection_timeout`
    /// when one is set; unbounded otherwise (§4.6/§6).
    pub async fn acquire(&self) -> CoreResult<Connection> {
        match self.config.connection_timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.acquire_inner())
                .await
                .unwrap_or_else(|_| {
                    warn!(
                        timeout_ms = deadline.as_millis() as u64,
                        "pool acquire timed out"
                    );
                    Err(CoreError::PoolTimeout)
                }),
            None => self.acquire_inner().await,
        }
    }

    async fn acquire_inner(&self) -> CoreResult<Connection> {
        loop {
            enum Action {
                Return(Connection),
                Open,
                Wait,
            }

            // Subscribe to notifications before inspecting state, not
            // after: `Notify` only remembers one stored wakeup for a
            // waiter that's actually registered, so if several tasks all
            // observe "no idle slot" and only then call `notified()`, a
            // burst of concurrent `release()` calls landing in that window
            // can collapse into a single delivered wakeup and strand the
            // rest. Registering first (`enable()`) means a `notify_one()`
            // from here on is never missed, even though the condition is
            // still rechecked before actually waiting.
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();

            let action = {
                let mut state = self.state.lock().expect("pool mutex poisoned");
                if let Some(conn) = state.idle.pop_front() {
                    Action::Return(conn)
                } else if state.total < self.config.pool_size {
                    // Reserve the slot before dropping the lock so a
                    // concurrent acquirer can't also claim it.
                    state.total += 1;
                    Action::Open
                } else {
                    Action::Wait
                }
            };

            match action {
                Action::Return(conn) => {
                    debug!("pool: handed out idle connection");
                    return Ok(conn);
                }
                Action::Open => {
                    return match Connection::open(
                        &self.config.path,
                        self.config.busy_timeout_ms,
                        &self.config.journal_mode,
                        self.config.cache_capacity,
                    ) {
                        Ok(conn) => {
                            debug!("pool: opened new connection");
                            Ok(conn)
                        }
                        Err(err) => {
                            // Opening failed; give the reserved slot back.
                            let mut state = self.state.lock().expect("pool mutex poisoned");
                            state.total -= 1;
                            self.notify.notify_one();
                            Err(err)
                        }
                    };
                }
                Action::Wait => {
                    notified.await;
                }
            }
        }
    }

    /// Return a connection to the idle queue and wake one waiter. If the
    /// pool is draining, the connection is closed instead (§4.6 drain).
    pub fn release(&self, conn: Connection) {
        if self.draining.load(Ordering::SeqCst) {
            let mut state = self.state.lock().expect("pool mutex poisoned");
            state.total -= 1;
            drop(state);
            conn.close();
            self.notify.notify_one();
            return;
        }

        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.idle.push_back(conn);
        drop(state);
        self.notify.notify_one();
    }

    /// Called instead of `release` when the connection was lost to a worker
    /// panic (§7) — the slot it held is simply freed up.
    pub fn forget(&self) {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.total = state.total.saturating_sub(1);
        drop(state);
        self.notify.notify_one();
    }

    /// Close every idle connection now, mark the pool draining so any
    /// future `release` closes rather than reuses, and wait for all
    /// outstanding connections to come back. Idempotent.
    pub async fn drain(&self) {
        self.draining.store(true, Ordering::SeqCst);

        let idle: Vec<Connection> = {
            let mut state = self.state.lock().expect("pool mutex poisoned");
            state.idle.drain(..).collect()
        };
        for conn in idle {
            let mut state = self.state.lock().expect("pool mutex poisoned");
            state.total = state.total.saturating_sub(1);
            drop(state);
            conn.close();
        }

        loop {
            let total = self.state.lock().expect("pool mutex poisoned").total;
            if total == 0 {
                return;
            }
            self.notify.notified().await;
        }
    }

    #[cfg(test)]
    pub fn outstanding(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.total - state.idle.len()
    }

    #[cfg(test)]
    pub fn idle_len(&self) -> usize {
        self.state.lock().unwrap().idle.len()
    }
}
