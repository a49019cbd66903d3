use crate::{
  batch::Batch,
  item::{RequestItem, ResponseItem},
  report::ItemFailure,
};
use log::{trace, warn};
use std::fmt::Display;

/// A type-state control flow driving one batch from assignment to completion. Running consumes the
/// pending task, so each batch is worked exactly once
pub struct WorkerTask<T>(pub(crate) T);

/// A batch assigned to a worker that has not started yet
pub struct Pending<R: RequestItem> {
  pub(crate) batch: Batch<R>,
}

/// A worker's finished batch: successes in batch order plus every item that was dropped
pub struct Completed<R: RequestItem, T: ResponseItem, E> {
  pub(crate) worker: usize,
  pub(crate) attempted: usize,
  pub(crate) responses: Vec<T>,
  pub(crate) failures: Vec<ItemFailure<R, E>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
  Completed,
  CompletedWithFailures { failed: usize },
}

impl<R> WorkerTask<Pending<R>>
where
  R: RequestItem,
{
  #[must_use]
  pub(crate) fn new(batch: Batch<R>) -> Self {
    WorkerTask(Pending { batch })
  }

  pub fn worker(&self) -> usize {
    self.0.batch.index
  }

  pub fn len(&self) -> usize {
    self.0.batch.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.batch.is_empty()
  }

  /// Work the batch strictly in order, one call per item. A failed item is logged and set aside; it
  /// never stops the rest of the batch
  #[must_use]
  pub fn run<S, T, E, F>(
    self,
    label: &str,
    session: &mut S,
    action: &F,
  ) -> WorkerTask<Completed<R, T, E>>
  where
    T: ResponseItem,
    E: Display,
    F: Fn(&mut S, &R) -> Result<T, E>,
  {
    let WorkerTask(Pending {
      batch: Batch { index, items },
    }) = self;

    let attempted = items.len();
    let mut responses = Vec::with_capacity(attempted);
    let mut failures = vec![];

    trace!("{} worker {} starting {} items", label, index, attempted);

    for item in items {
      match action(session, &item) {
        Ok(response) => responses.push(response),
        Err(error) => {
          warn!(
            "{} worker {} dropped {:?}: {}",
            label, index, &item, &error
          );

          failures.push(ItemFailure {
            worker: index,
            item,
            error,
          });
        }
      }
    }

    WorkerTask(Completed {
      worker: index,
      attempted,
      responses,
      failures,
    })
  }
}

impl<R, T, E> WorkerTask<Completed<R, T, E>>
where
  R: RequestItem,
  T: ResponseItem,
{
  pub fn worker(&self) -> usize {
    self.0.worker
  }

  pub fn responses(&self) -> &[T] {
    &self.0.responses
  }

  pub fn outcome(&self) -> WorkerOutcome {
    match self.0.failures.len() {
      0 => WorkerOutcome::Completed,
      failed => WorkerOutcome::CompletedWithFailures { failed },
    }
  }
}
