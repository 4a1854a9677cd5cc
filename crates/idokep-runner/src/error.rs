//! Error types for the runner.

/// Errors that can stop record intake.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Reading the record stream failed.
    #[error("failed to read records: {0}")]
    Io(#[from] std::io::Error),

    /// The upload worker is no longer accepting records.
    #[error("upload worker stopped before intake finished")]
    WorkerGone,
}
