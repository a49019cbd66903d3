use crate::error::DispatchError;
use std::fmt;

/// A dropped item, handed back alongside the error that dropped it
#[derive(Debug)]
pub struct ItemFailure<R, E> {
  pub worker: usize,
  pub item: R,
  pub error: E,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerFault {
  /// The worker thread panicked; its partial results are lost
  Panicked(String),
  /// The OS refused to start the worker thread; no item in the batch was attempted
  Spawn(String),
  /// The per-worker session could not be established; no item in the batch was attempted
  SessionInit(String),
}

impl fmt::Display for WorkerFault {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WorkerFault::Panicked(msg) => write!(f, "panicked: {}", msg),
      WorkerFault::Spawn(msg) => write!(f, "thread spawn failed: {}", msg),
      WorkerFault::SessionInit(msg) => write!(f, "session init failed: {}", msg),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
  pub worker: usize,
  pub batch_len: usize,
  pub fault: WorkerFault,
}

/// Outcome of one dispatch call. Response order is only meaningful within a single worker's
/// contribution
#[derive(Debug)]
pub struct DispatchReport<R, T, E> {
  pub responses: Vec<T>,
  pub failures: Vec<ItemFailure<R, E>>,
  pub worker_failures: Vec<WorkerFailure>,
  pub attempted: usize,
  pub workers: usize,
}

impl<R, T, E> DispatchReport<R, T, E> {
  pub(crate) fn empty() -> Self {
    DispatchReport {
      responses: vec![],
      failures: vec![],
      worker_failures: vec![],
      attempted: 0,
      workers: 0,
    }
  }

  pub fn succeeded(&self) -> usize {
    self.responses.len()
  }

  /// Every item produced a response
  pub fn is_complete(&self) -> bool {
    self.failures.is_empty() && self.worker_failures.is_empty()
  }

  /// At least one worker died or never started, so some items were never attempted or their results
  /// were lost
  pub fn is_corrupted(&self) -> bool {
    !self.worker_failures.is_empty()
  }

  pub fn into_responses(self) -> Vec<T> {
    self.responses
  }

  /// Accept dropped items but reject lost workers
  pub fn into_result(self) -> Result<Vec<T>, DispatchError> {
    if self.is_corrupted() {
      Err(DispatchError::WorkersFailed {
        failed: self.worker_failures.len(),
        workers: self.workers,
      })
    } else {
      Ok(self.responses)
    }
  }

  /// Fold another report into this one, as when one action is performed in two passes
  pub fn merge(mut self, other: DispatchReport<R, T, E>) -> Self {
    self.responses.extend(other.responses);
    self.failures.extend(other.failures);
    self.worker_failures.extend(other.worker_failures);
    self.attempted += other.attempted;
    self.workers += other.workers;
    self
  }

  pub fn map_responses<U, F>(self, f: F) -> DispatchReport<R, U, E>
  where
    F: FnMut(T) -> U,
  {
    let DispatchReport {
      responses,
      failures,
      worker_failures,
      attempted,
      workers,
    } = self;

    DispatchReport {
      responses: responses.into_iter().map(f).collect(),
      failures,
      worker_failures,
      attempted,
      workers,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn report(responses: Vec<i32>) -> DispatchReport<i32, i32, &'static str> {
    DispatchReport {
      attempted: responses.len(),
      responses,
      failures: vec![],
      worker_failures: vec![],
      workers: 1,
    }
  }

  #[test]
  fn it_separates_partial_success_from_corruption() {
    let mut partial = report(vec![10]);
    partial.attempted = 2;
    partial.failures.push(ItemFailure {
      worker: 0,
      item: 2,
      error: "boom",
    });

    assert!(!partial.is_complete());
    assert!(!partial.is_corrupted());
    assert_eq!(partial.into_result(), Ok(vec![10]));

    let mut corrupted = report(vec![10]);
    corrupted.worker_failures.push(WorkerFailure {
      worker: 1,
      batch_len: 3,
      fault: WorkerFault::Panicked("boom".into()),
    });
    corrupted.workers = 2;

    assert!(corrupted.is_corrupted());
    assert_eq!(
      corrupted.into_result(),
      Err(DispatchError::WorkersFailed {
        failed: 1,
        workers: 2
      })
    );
  }

  #[test]
  fn it_merges_reports() {
    let merged = report(vec![1, 2]).merge(report(vec![3]));

    assert_eq!(merged.responses, vec![1, 2, 3]);
    assert_eq!(merged.attempted, 3);
    assert_eq!(merged.workers, 2);
    assert!(merged.is_complete());
  }

  #[test]
  fn it_maps_responses_and_keeps_failures() {
    let mut partial = report(vec![1, 2]);
    partial.failures.push(ItemFailure {
      worker: 0,
      item: 3,
      error: "boom",
    });

    let mapped = partial.map_responses(|n| format!("#{}", n));

    assert_eq!(mapped.responses, vec!["#1", "#2"]);
    assert_eq!(mapped.failures[0].item, 3);
    assert_eq!(mapped.attempted, 2);
  }
}
