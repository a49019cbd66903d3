use crate::{
  batch::partition,
  error::DispatchError,
  item::{RequestItem, ResponseItem},
  report::DispatchReport,
  worker::run_workers,
};
use log::info;
use std::{convert::Infallible, fmt::Display};

/// Fans a flat list of requests out over a fixed number of worker threads and fans the responses
/// back in once every worker has finished
#[derive(Debug, Clone)]
pub struct Dispatcher {
  thread_count: usize,
  label: Option<&'static str>,
}

impl Dispatcher {
  /// Contract violations are rejected here, before any thread exists
  pub fn new(thread_count: usize) -> Result<Self, DispatchError> {
    if thread_count.eq(&0) {
      return Err(DispatchError::InvalidThreadCount(thread_count));
    }

    Ok(Dispatcher {
      thread_count,
      label: None,
    })
  }

  /// A single worker; items are performed one after another in input order
  pub fn serial() -> Self {
    Dispatcher {
      thread_count: 1,
      label: None,
    }
  }

  /// Name used in log records and worker thread names. Defaults to the request type name
  pub fn with_label(mut self, label: &'static str) -> Self {
    self.label = Some(label);
    self
  }

  pub fn thread_count(&self) -> usize {
    self.thread_count
  }

  fn label<R>(&self) -> String {
    match self.label {
      Some(label) => label.to_string(),
      None => tynm::type_name::<R>(),
    }
  }

  /// Invoke `action` exactly once per request across at most `thread_count` workers.
  ///
  /// Item `i` is worked by worker `i % thread_count`. A failed item is logged and dropped without
  /// disturbing its batch or sibling batches; a worker that dies is reported in
  /// [`DispatchReport::worker_failures`]
  pub fn dispatch<R, T, E, F>(
    &self,
    requests: Vec<R>,
    action: F,
  ) -> Result<DispatchReport<R, T, E>, DispatchError>
  where
    R: RequestItem,
    T: ResponseItem,
    E: Send + Display,
    F: Fn(&R) -> Result<T, E> + Sync,
  {
    self.dispatch_with_session(
      requests,
      || Ok::<(), Infallible>(()),
      move |_: &mut (), item: &R| action(item),
    )
  }

  /// Like [`Dispatcher::dispatch`], except each worker first opens its own session with `connect`
  /// and hands it to every call in its batch. A worker whose session cannot be opened attempts none
  /// of its items
  pub fn dispatch_with_session<R, S, T, E, C, CE, F>(
    &self,
    requests: Vec<R>,
    connect: C,
    action: F,
  ) -> Result<DispatchReport<R, T, E>, DispatchError>
  where
    R: RequestItem,
    T: ResponseItem,
    E: Send + Display,
    C: Fn() -> Result<S, CE> + Sync,
    CE: Display,
    F: Fn(&mut S, &R) -> Result<T, E> + Sync,
  {
    let label = self.label::<R>();

    if requests.is_empty() {
      info!("performed 0/0 {} actions", label);
      return Ok(DispatchReport::empty());
    }

    let attempted = requests.len();
    let batches = partition(requests, self.thread_count);

    let mut report = run_workers(&label, batches, &connect, &action)?;
    report.attempted = attempted;

    info!(
      "performed {}/{} {} actions",
      report.succeeded(),
      attempted,
      label
    );

    Ok(report)
  }

  /// Run [`Dispatcher::dispatch`] on the tokio blocking pool so async callers are not stalled by
  /// the blocking calls
  pub async fn spawn_dispatch<R, T, E, F>(
    &self,
    requests: Vec<R>,
    action: F,
  ) -> Result<DispatchReport<R, T, E>, DispatchError>
  where
    R: RequestItem + 'static,
    T: ResponseItem + 'static,
    E: Send + Display + 'static,
    F: Fn(&R) -> Result<T, E> + Send + Sync + 'static,
  {
    let dispatcher = self.clone();

    tokio::task::spawn_blocking(move || dispatcher.dispatch(requests, action))
      .await
      .map_err(|err| DispatchError::Join(err.to_string()))?
  }
}
