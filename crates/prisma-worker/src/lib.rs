//! Prisma Worker: runs the grading engine off the caller's thread.
//!
//! A single worker thread consumes requests in arrival order and answers
//! each with exactly one reply. Callers either talk to it through a
//! [`WorkerHandle`] or call [`RequestHandler`] directly in-process.

pub mod config;
pub mod error;
pub mod protocol;
pub mod worker;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use protocol::{WireBuffer, WorkerReply, WorkerRequest};
pub use worker::{RequestHandler, RequestId, WorkerHandle, spawn};
