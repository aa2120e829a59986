//! The offload dispatcher (C5): bridges a suspended host task to the worker
//! pool via a `oneshot` completion channel, per §4.5.
//!
//! Grounded on the pack's `sqld` example (`database/libsql.rs`), which pairs
//! a `crossbeam::channel::Sender<Message>` into a worker with a
//! `tokio::sync::oneshot::Sender` for the reply — the same split used here,
//! deliberately not `tokio::task::spawn_blocking`, because that pool is
//! unbounded and dynamically sized, not the fixed `max(2, pool_size)` worker
//! pool §4.4 calls for.

use tracing::debug;

use crate::connection::Connection;
use crate::error::CoreError;
use crate::job::{Job, JobReply, Operation, Outcome};
use crate::worker::WorkerPool;

/// Submits jobs to a [`WorkerPool`] and awaits their completion without
/// blocking the host scheduler's thread.
pub struct Dispatcher {
    workers: WorkerPool,
}

/// The result of dispatching one job. A worker panic loses the connection
/// (§7: dropped, not returned to the pool); any other outcome — success or
/// an ordinary engine error — hands the connection back so the caller can
/// release it to C6.
pub enum Dispatched {
    Completed {
        connection: Connection,
        result: Result<Outcome, CoreError>,
    },
    ConnectionLost(CoreError),
}

impl Dispatcher {
    pub fn new(pool_size: usize) -> Self {
        Dispatcher {
            workers: WorkerPool::new(pool_size),
        }
    }

    /// Submit `operation` against `connection` and suspend until a worker
    /// completes it.
    pub async fn submit(&self, connection: Connection, operation: Operation) -> Dispatched {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        let job = Job {
            connection,
            operation,
            reply: reply_tx,
        };

        self.workers.submit(job);

        // If this suspension is cancelled (the host task is dropped before
        // the job completes), `reply_rx` is simply dropped here: the worker
        // still runs the job to completion and the result is discarded,
        // per §4.5's cancellation policy. There is nothing to do about that
        // from this side other than not blocking on it forever.
        match reply_rx.await {
            Ok(JobReply::Done(connection, result)) => {
                debug!("job completed");
                Dispatched::Completed { connection, result }
            }
            Ok(JobReply::WorkerPanicked(err)) => Dispatched::ConnectionLost(err),
            Err(_recv_error) => Dispatched::ConnectionLost(CoreError::worker_panicked()),
        }
    }
}
