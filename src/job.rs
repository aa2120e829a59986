//! The unit of work handed from the dispatcher (C5) to a worker thread (C4).
//!
//! A job owns the connection it needs for its duration, so "any worker may
//! service any job" (§4.4) — there is no per-connection affinity to route
//! on, only the job's own payload. Grounded on the `sqld` pack example's
//! `Message { queries, resp }` shape (`database/libsql.rs`), adapted from a
//! batch-of-statements message to the core's single-operation job.

use tokio::sync::oneshot;

use crate::connection::Connection;
use crate::error::CoreError;
use crate::row::Row;
use crate::value::Value;

/// What a job asks the engine to do.
pub enum Operation {
    Execute { sql: String, params: Vec<Value> },
    ExecuteMany { sql: String, param_sets: Vec<Vec<Value>> },
    FetchAll { sql: String, params: Vec<Value> },
    FetchOne { sql: String, params: Vec<Value> },
    FetchOptional { sql: String, params: Vec<Value> },
    Begin,
    Commit,
    Rollback,
    SetPragma { name: String, value: String },
}

/// What executing an [`Operation`] produces, besides a possible error.
pub enum Outcome {
    Unit,
    Rows(Vec<Row>),
    Row(Row),
    OptionalRow(Option<Row>),
}

/// Delivered back to the dispatcher once a worker finishes the job. The
/// connection only comes back when it's still usable: a plain engine error
/// leaves the connection fine to reuse, but a worker panic means the
/// connection is dropped instead of returned to the pool (§7).
pub enum JobReply {
    Done(Connection, Result<Outcome, CoreError>),
    WorkerPanicked(CoreError),
}

/// A single piece of work plus the connection it runs against and the
/// channel its result is delivered on.
pub struct Job {
    pub connection: Connection,
    pub operation: Operation,
    pub reply: oneshot::Sender<JobReply>,
}

/// Run an operation against a connection. Kept separate from the channel
/// plumbing so the worker loop can wrap just this call in `catch_unwind`
/// while keeping the connection and reply sender outside the unwind guard.
pub(crate) fn execute(conn: &Connection, operation: Operation) -> Result<Outcome, CoreError> {
    match operation {
        Operation::Execute { sql, params } => {
            conn.execute(&sql, &params)?;
            Ok(Outcome::Unit)
        }
        Operation::ExecuteMany { sql, param_sets } => {
            conn.execute_many(&sql, &param_sets)?;
            Ok(Outcome::Unit)
        }
        Operation::FetchAll { sql, params } => Ok(Outcome::Rows(conn.fetch_all(&sql, &params)?)),
        Operation::FetchOne { sql, params } => Ok(Outcome::Row(conn.fetch_one(&sql, &params)?)),
        Operation::FetchOptional { sql, params } => {
            Ok(Outcome::OptionalRow(conn.fetch_optional(&sql, &params)?))
        }
        Operation::Begin => {
            conn.begin()?;
            Ok(Outcome::Unit)
        }
        Operation::Commit => {
            conn.commit()?;
            Ok(Outcome::Unit)
        }
        Operation::Rollback => {
            conn.rollback()?;
            Ok(Outcome::Unit)
        }
        Operation::SetPragma { name, value } => {
            conn.set_pragma(&name, &value)?;
            Ok(Outcome::Unit)
        }
    }
}
