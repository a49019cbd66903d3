use crate::{
  config::ClientParams,
  error::RemoteError,
  model::{
    Bonus, QualificationGrant, QualificationRevocation, QualificationType, Submission,
    SubmissionStatus, Task, TaskPage, TaskSpec, WorkerNotice,
  },
};
use chrono::{DateTime, Utc};

/// Entry point to the vendor's API. Sessions are opened per worker thread and never shared
pub trait Marketplace: Sync {
  type Client: MarketplaceClient;

  fn connect(&self, params: &ClientParams) -> Result<Self::Client, RemoteError>;
}

/// One authenticated session; every method is a single blocking round trip
pub trait MarketplaceClient {
  fn create_task(&mut self, spec: &TaskSpec) -> Result<Task, RemoteError>;

  fn get_task(&mut self, task_id: &str) -> Result<Task, RemoteError>;

  fn list_tasks(
    &mut self,
    next_token: Option<&str>,
    page_size: u32,
  ) -> Result<TaskPage, RemoteError>;

  fn list_submissions(
    &mut self,
    task_id: &str,
    statuses: &[SubmissionStatus],
    max_results: u32,
  ) -> Result<Vec<Submission>, RemoteError>;

  fn approve_submission(
    &mut self,
    submission_id: &str,
    feedback: &str,
    override_rejection: bool,
  ) -> Result<(), RemoteError>;

  fn update_review_status(&mut self, task_id: &str, revert: bool) -> Result<(), RemoteError>;

  fn update_expiration(
    &mut self,
    task_id: &str,
    expire_at: DateTime<Utc>,
  ) -> Result<(), RemoteError>;

  fn delete_task(&mut self, task_id: &str) -> Result<(), RemoteError>;

  /// Returns the new qualification id
  fn create_qualification_type(
    &mut self,
    qualification: &QualificationType,
  ) -> Result<String, RemoteError>;

  fn grant_qualification(&mut self, grant: &QualificationGrant) -> Result<(), RemoteError>;

  fn revoke_qualification(
    &mut self,
    revocation: &QualificationRevocation,
  ) -> Result<(), RemoteError>;

  fn notify_workers(&mut self, notice: &WorkerNotice) -> Result<(), RemoteError>;

  fn send_bonus(&mut self, bonus: &Bonus) -> Result<(), RemoteError>;

  fn account_balance(&mut self) -> Result<f64, RemoteError>;
}
