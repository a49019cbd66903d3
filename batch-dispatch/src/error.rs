use thiserror::Error;

/// Dispatch-level failures. Per-item remote failures never surface here; they are carried by
/// [`crate::DispatchReport`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
  #[error("thread count must be at least 1, got {0}")]
  InvalidThreadCount(usize),
  #[error("{failed} of {workers} workers failed before finishing their batch")]
  WorkersFailed { failed: usize, workers: usize },
  #[error("dispatch task could not be joined: {0}")]
  Join(String),
}
