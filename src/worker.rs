//! The worker pool (C4): a fixed-size collection of OS threads that drain a
//! shared job queue, sized to `max(2, pool_size)` at construction and
//! otherwise independent of the connection pool's own sizing (§4.4).
//!
//! Grounded on the pack's `gvthread` fixed-pool example (`fixed_pool.rs`):
//! same shape of a bounded set of named threads pulling from one queue,
//! shut down by closing the channel rather than a flag each worker polls.

use crossbeam_channel::{Receiver, Sender};
use tracing::error;

use crate::error::CoreError;
use crate::job::{self, Job, JobReply};

/// Owns the sending half of the job queue and the join handles of its
/// worker threads. Dropping this (after closing the sender) lets every
/// worker thread drain its last job and exit.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    handles: Vec<std::thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `max(2, pool_size)` worker threads sharing one unbounded job
    /// queue.
    pub fn new(pool_size: usize) -> Self {
        let worker_count = pool_size.max(2);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();

        let handles = (0..worker_count)
            .map(|idx| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("asqlite-worker-{idx}"))
                    .spawn(move || worker_loop(receiver))
                    .expect("failed to spawn asqlite worker thread")
            })
            .collect();

        WorkerPool {
            sender: Some(sender),
            handles,
        }
    }

    /// Enqueue a job. Any live worker may pick it up.
    pub fn submit(&self, job: Job) {
        // An error here means every worker thread has exited, which only
        // happens after the pool itself is dropped; there is no well-formed
        // caller left to report to.
        if let Some(sender) = &self.sender {
            let _ = sender.send(job);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Close the queue first so every worker's `recv()` returns `Err`
        // once it's drained, then join — otherwise the threads block
        // forever waiting on a channel that's still open.
        self.sender.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(receiver: Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        let Job {
            connection,
            operation,
            reply,
        } = job;

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            job::execute(&connection, operation)
        }));

        match outcome {
            Ok(result) => {
                let _ = reply.send(JobReply::Done(connection, result));
            }
            Err(_panic) => {
                error!("asqlite worker thread panicked while executing a job");
                // `connection` is dropped here rather than handed back,
                // per §7: the offending connection is not returned to the
                // pool.
                let _ = reply.send(JobReply::WorkerPanicked(CoreError::worker_panicked()));
            }
        }
    }
}
