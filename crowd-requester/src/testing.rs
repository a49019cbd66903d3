use crate::{
  config::ClientParams,
  error::RemoteError,
  marketplace::{Marketplace, MarketplaceClient},
  model::{
    Bonus, QualificationGrant, QualificationRevocation, QualificationType, Submission,
    SubmissionStatus, Task, TaskPage, TaskSpec, TaskStatus, WorkerNotice,
  },
  storage::{ObjectPage, ObjectStore, ObjectStoreClient, ObjectSummary},
};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::{
  collections::{BTreeMap, HashSet},
  sync::Arc,
};

/// Everything the fake marketplace has been asked to do
#[derive(Default)]
pub(crate) struct MarketState {
  pub tasks: BTreeMap<String, Task>,
  pub submissions: BTreeMap<String, Vec<Submission>>,
  pub approved: Vec<String>,
  pub reviewing: Vec<(String, bool)>,
  pub expired: Vec<(String, DateTime<Utc>)>,
  pub deleted: Vec<String>,
  pub qualification_types: Vec<QualificationType>,
  pub grants: Vec<QualificationGrant>,
  pub revocations: Vec<QualificationRevocation>,
  pub notices: Vec<WorkerNotice>,
  pub bonuses: Vec<Bonus>,
  pub balance: f64,
  pub sessions: usize,
  /// Ids or titles that make any call touching them fail
  pub rejecting: HashSet<String>,
  pub refuse_sessions: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeMarketplace {
  pub state: Arc<Mutex<MarketState>>,
}

pub(crate) struct FakeClient {
  state: Arc<Mutex<MarketState>>,
}

impl FakeMarketplace {
  pub fn with_tasks(tasks: Vec<Task>) -> Self {
    let market = FakeMarketplace::default();

    market
      .state
      .lock()
      .tasks
      .extend(tasks.into_iter().map(|task| (task.id.clone(), task)));

    market
  }

  pub fn reject(&self, id: &str) {
    self.state.lock().rejecting.insert(id.to_string());
  }
}

pub(crate) fn task(id: &str, status: TaskStatus) -> Task {
  Task {
    id: id.to_string(),
    title: format!("task {}", id),
    status,
    max_assignments: 1,
    expires_at: None,
  }
}

pub(crate) fn submission(
  id: &str,
  task_id: &str,
  status: SubmissionStatus,
  answer: Option<&str>,
) -> Submission {
  Submission {
    id: id.to_string(),
    task_id: task_id.to_string(),
    worker_id: format!("W-{}", id),
    status,
    answer: answer.map(String::from),
    submitted_at: None,
  }
}

impl Marketplace for FakeMarketplace {
  type Client = FakeClient;

  fn connect(&self, _params: &ClientParams) -> Result<FakeClient, RemoteError> {
    let mut state = self.state.lock();

    if state.refuse_sessions {
      return Err(RemoteError::Connection(String::from("profile not found")));
    }

    state.sessions += 1;

    Ok(FakeClient {
      state: self.state.clone(),
    })
  }
}

impl FakeClient {
  fn check(&self, id: &str) -> Result<(), RemoteError> {
    if self.state.lock().rejecting.contains(id) {
      Err(RemoteError::Service {
        code: String::from("RequestError"),
        message: format!("{} rejected", id),
      })
    } else {
      Ok(())
    }
  }

  fn known_task(&self, task_id: &str) -> Result<Task, RemoteError> {
    self.check(task_id)?;

    self
      .state
      .lock()
      .tasks
      .get(task_id)
      .cloned()
      .ok_or_else(|| RemoteError::Request(format!("task {} does not exist", task_id)))
  }
}

impl MarketplaceClient for FakeClient {
  fn create_task(&mut self, spec: &TaskSpec) -> Result<Task, RemoteError> {
    self.check(&spec.question)?;

    let mut state = self.state.lock();
    let task = Task {
      id: format!("T{}", state.tasks.len() + 1),
      title: spec.title.clone(),
      status: TaskStatus::Assignable,
      max_assignments: spec.max_assignments,
      expires_at: None,
    };

    state.tasks.insert(task.id.clone(), task.clone());

    Ok(task)
  }

  fn get_task(&mut self, task_id: &str) -> Result<Task, RemoteError> {
    self.known_task(task_id)
  }

  fn list_tasks(
    &mut self,
    next_token: Option<&str>,
    page_size: u32,
  ) -> Result<TaskPage, RemoteError> {
    let state = self.state.lock();
    let start: usize = next_token.and_then(|token| token.parse().ok()).unwrap_or(0);
    let end = (start + page_size as usize).min(state.tasks.len());

    let tasks = state
      .tasks
      .values()
      .skip(start)
      .take(end - start)
      .cloned()
      .collect();

    let next_token = if end < state.tasks.len() {
      Some(end.to_string())
    } else {
      None
    };

    Ok(TaskPage { tasks, next_token })
  }

  fn list_submissions(
    &mut self,
    task_id: &str,
    statuses: &[SubmissionStatus],
    max_results: u32,
  ) -> Result<Vec<Submission>, RemoteError> {
    self.known_task(task_id)?;

    Ok(
      self
        .state
        .lock()
        .submissions
        .get(task_id)
        .map(|submissions| {
          submissions
            .iter()
            .filter(|submission| statuses.contains(&submission.status))
            .take(max_results as usize)
            .cloned()
            .collect()
        })
        .unwrap_or_default(),
    )
  }

  fn approve_submission(
    &mut self,
    submission_id: &str,
    _feedback: &str,
    _override_rejection: bool,
  ) -> Result<(), RemoteError> {
    self.check(submission_id)?;
    self.state.lock().approved.push(submission_id.to_string());
    Ok(())
  }

  fn update_review_status(&mut self, task_id: &str, revert: bool) -> Result<(), RemoteError> {
    self.known_task(task_id)?;
    self
      .state
      .lock()
      .reviewing
      .push((task_id.to_string(), revert));
    Ok(())
  }

  fn update_expiration(
    &mut self,
    task_id: &str,
    expire_at: DateTime<Utc>,
  ) -> Result<(), RemoteError> {
    self.known_task(task_id)?;
    self
      .state
      .lock()
      .expired
      .push((task_id.to_string(), expire_at));
    Ok(())
  }

  fn delete_task(&mut self, task_id: &str) -> Result<(), RemoteError> {
    self.known_task(task_id)?;

    let mut state = self.state.lock();
    state.tasks.remove(task_id);
    state.deleted.push(task_id.to_string());

    Ok(())
  }

  fn create_qualification_type(
    &mut self,
    qualification: &QualificationType,
  ) -> Result<String, RemoteError> {
    let mut state = self.state.lock();
    state.qualification_types.push(qualification.clone());
    Ok(format!("Q{}", state.qualification_types.len()))
  }

  fn grant_qualification(&mut self, grant: &QualificationGrant) -> Result<(), RemoteError> {
    self.check(&grant.worker_id)?;
    self.state.lock().grants.push(grant.clone());
    Ok(())
  }

  fn revoke_qualification(
    &mut self,
    revocation: &QualificationRevocation,
  ) -> Result<(), RemoteError> {
    self.check(&revocation.worker_id)?;
    self.state.lock().revocations.push(revocation.clone());
    Ok(())
  }

  fn notify_workers(&mut self, notice: &WorkerNotice) -> Result<(), RemoteError> {
    self.state.lock().notices.push(notice.clone());
    Ok(())
  }

  fn send_bonus(&mut self, bonus: &Bonus) -> Result<(), RemoteError> {
    self.check(&bonus.submission_id)?;

    let mut state = self.state.lock();
    state.balance -= bonus.amount;
    state.bonuses.push(bonus.clone());

    Ok(())
  }

  fn account_balance(&mut self) -> Result<f64, RemoteError> {
    Ok(self.state.lock().balance)
  }
}

/// Listing pages are kept tiny so paging is exercised
const STORE_PAGE_SIZE: usize = 2;

pub(crate) struct StoredObject {
  pub body: Vec<u8>,
  pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
pub(crate) struct StoreState {
  pub objects: BTreeMap<(String, String), StoredObject>,
  /// Profile named by every session opened
  pub profiles: Vec<String>,
  writes: i64,
}

#[derive(Clone, Default)]
pub(crate) struct FakeObjectStore {
  pub state: Arc<Mutex<StoreState>>,
}

pub(crate) struct FakeStoreClient {
  state: Arc<Mutex<StoreState>>,
}

impl FakeObjectStore {
  pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
    self
      .state
      .lock()
      .put(bucket, key, body);
  }
}

impl StoreState {
  /// Each write lands one second after the previous one
  fn put(&mut self, bucket: &str, key: &str, body: Vec<u8>) {
    self.writes += 1;

    let last_modified = Utc.timestamp_opt(1_600_000_000 + self.writes, 0).unwrap();

    self.objects.insert(
      (bucket.to_string(), key.to_string()),
      StoredObject {
        body,
        last_modified,
      },
    );
  }
}

impl ObjectStore for FakeObjectStore {
  type Client = FakeStoreClient;

  fn connect(&self, profile_name: &str) -> Result<FakeStoreClient, RemoteError> {
    self.state.lock().profiles.push(profile_name.to_string());

    Ok(FakeStoreClient {
      state: self.state.clone(),
    })
  }
}

impl ObjectStoreClient for FakeStoreClient {
  fn put_object(&mut self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), RemoteError> {
    self.state.lock().put(bucket, key, body);
    Ok(())
  }

  fn get_object(&mut self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteError> {
    self
      .state
      .lock()
      .objects
      .get(&(bucket.to_string(), key.to_string()))
      .map(|object| object.body.clone())
      .ok_or_else(|| RemoteError::Request(format!("no such key {}", key)))
  }

  fn list_objects(
    &mut self,
    bucket: &str,
    prefix: &str,
    next_token: Option<&str>,
  ) -> Result<ObjectPage, RemoteError> {
    let state = self.state.lock();
    let start: usize = next_token.and_then(|token| token.parse().ok()).unwrap_or(0);

    let matching = state
      .objects
      .iter()
      .filter(|((object_bucket, key), _)| object_bucket == bucket && key.starts_with(prefix))
      .map(|((_, key), object)| ObjectSummary {
        key: key.clone(),
        size: object.body.len() as u64,
        last_modified: object.last_modified,
      })
      .collect::<Vec<_>>();

    let end = (start + STORE_PAGE_SIZE).min(matching.len());

    let next_token = if end < matching.len() {
      Some(end.to_string())
    } else {
      None
    };

    Ok(ObjectPage {
      objects: matching[start..end].to_vec(),
      next_token,
    })
  }
}
