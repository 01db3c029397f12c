//! Worker transport errors.

use prisma_core::ErrorCode;

/// Errors seen by a caller talking to a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker `{0}` has stopped")]
    Stopped(String),

    /// The worker answered with an error reply.
    #[error("request rejected ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },
}

impl WorkerError {
    /// Wire code for rejected requests, `None` for transport failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}
