use crate::{
  batch::{occupied, Batch},
  error::DispatchError,
  item::{RequestItem, ResponseItem},
  report::{DispatchReport, WorkerFailure, WorkerFault},
  task::{Completed, WorkerTask},
};
use crossbeam::{queue::SegQueue, thread};
use itertools::Itertools;
use log::{debug, error};
use std::{any::Any, fmt::Display};

/// Collects finished batches from every worker of one dispatch call. Each worker pushes once, so a
/// worker's responses are never interleaved with another's
pub(crate) struct ResultSink<R: RequestItem, T: ResponseItem, E> {
  queue: SegQueue<WorkerTask<Completed<R, T, E>>>,
}

impl<R, T, E> ResultSink<R, T, E>
where
  R: RequestItem,
  T: ResponseItem,
{
  fn new() -> Self {
    ResultSink {
      queue: SegQueue::new(),
    }
  }

  fn push(&self, task: WorkerTask<Completed<R, T, E>>) {
    self.queue.push(task);
  }

  fn drain(self) -> Vec<WorkerTask<Completed<R, T, E>>> {
    std::iter::from_fn(|| self.queue.pop()).collect_vec()
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  match payload.downcast::<String>() {
    Ok(msg) => *msg,
    Err(payload) => match payload.downcast::<&'static str>() {
      Ok(msg) => msg.to_string(),
      Err(_) => String::from("unknown panic payload"),
    },
  }
}

/// Run every non-empty batch on its own scoped thread and block until all of them are joined. Each
/// worker opens its own session before touching its batch
pub(crate) fn run_workers<R, S, T, E, C, CE, F>(
  label: &str,
  batches: Vec<Batch<R>>,
  connect: &C,
  action: &F,
) -> Result<DispatchReport<R, T, E>, DispatchError>
where
  R: RequestItem,
  T: ResponseItem,
  E: Send + Display,
  C: Fn() -> Result<S, CE> + Sync,
  CE: Display,
  F: Fn(&mut S, &R) -> Result<T, E> + Sync,
{
  let sink: ResultSink<R, T, E> = ResultSink::new();
  let sink_ref = &sink;

  let worker_failures = thread::scope(|scope| {
    let handles = occupied(batches)
      .map(|batch| {
        let task = WorkerTask::new(batch);
        let worker = task.worker();
        let batch_len = task.len();

        let handle = scope
          .builder()
          .name(format!("{}-worker-{}", label, worker))
          .spawn(move |_| -> Result<(), WorkerFault> {
            let mut session =
              connect().map_err(|err| WorkerFault::SessionInit(err.to_string()))?;

            sink_ref.push(task.run(label, &mut session, action));

            Ok(())
          });

        (worker, batch_len, handle)
      })
      .collect_vec();

    handles
      .into_iter()
      .filter_map(|(worker, batch_len, handle)| {
        let fault = match handle {
          Ok(handle) => match handle.join() {
            Ok(Ok(())) => return None,
            Ok(Err(fault)) => fault,
            Err(payload) => WorkerFault::Panicked(panic_message(payload)),
          },
          Err(err) => WorkerFault::Spawn(err.to_string()),
        };

        error!("{} worker {} failed ({} items): {}", label, worker, batch_len, &fault);

        Some(WorkerFailure {
          worker,
          batch_len,
          fault,
        })
      })
      .collect_vec()
  })
  .map_err(|payload| DispatchError::Join(panic_message(payload)))?;

  let mut report = DispatchReport::empty();

  for task in sink.drain() {
    debug!(
      "{} worker {} finished {} items: {:?}",
      label,
      task.worker(),
      task.0.attempted,
      task.outcome()
    );

    let WorkerTask(Completed {
      responses,
      failures,
      ..
    }) = task;

    report.responses.extend(responses);
    report.failures.extend(failures);
    report.workers += 1;
  }

  report.workers += worker_failures.len();
  report.worker_failures = worker_failures;

  Ok(report)
}
