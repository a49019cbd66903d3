use crate::{
  error::RemoteError,
  marketplace::MarketplaceClient,
  model::{
    Bonus, QualificationGrant, QualificationRevocation, QualificationType, Submission,
    SubmissionStatus, Task, TaskPage, TaskSpec, TaskSubmissions, WorkerNotice,
  },
};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Debug};

/// 2001-01-01T00:00:00Z; any instant in the past expires a task immediately
const PAST_EXPIRY_TIMESTAMP: i64 = 978_307_200;
pub const DEFAULT_SUBMISSION_PAGE: u32 = 50;
pub const APPROVAL_FEEDBACK: &str = "good";

/// The closed set of remote operations this crate performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
  CreateTask,
  GetTask,
  ListTasks,
  ListSubmissions,
  ApproveSubmission,
  UpdateReviewStatus,
  ExpireTask,
  DeleteTask,
  CreateQualificationType,
  GrantQualification,
  RevokeQualification,
  NotifyWorkers,
  SendBonus,
  GetAccountBalance,
}

impl Operation {
  pub fn name(&self) -> &'static str {
    match self {
      Operation::CreateTask => "create_task",
      Operation::GetTask => "get_task",
      Operation::ListTasks => "list_tasks",
      Operation::ListSubmissions => "list_submissions",
      Operation::ApproveSubmission => "approve_submission",
      Operation::UpdateReviewStatus => "update_review_status",
      Operation::ExpireTask => "expire_task",
      Operation::DeleteTask => "delete_task",
      Operation::CreateQualificationType => "create_qualification_type",
      Operation::GrantQualification => "grant_qualification",
      Operation::RevokeQualification => "revoke_qualification",
      Operation::NotifyWorkers => "notify_workers",
      Operation::SendBonus => "send_bonus",
      Operation::GetAccountBalance => "get_account_balance",
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Arguments for exactly one remote round trip
pub trait RemoteCall: Send + Debug {
  type Response: Send;
  const OPERATION: Operation;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<Self::Response, RemoteError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTask(pub TaskSpec);

impl RemoteCall for CreateTask {
  type Response = Task;
  const OPERATION: Operation = Operation::CreateTask;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<Task, RemoteError> {
    client.create_task(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTask {
  pub task_id: String,
}

impl From<&Task> for GetTask {
  fn from(task: &Task) -> Self {
    GetTask {
      task_id: task.id.clone(),
    }
  }
}

impl RemoteCall for GetTask {
  type Response = Task;
  const OPERATION: Operation = Operation::GetTask;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<Task, RemoteError> {
    client.get_task(&self.task_id)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTasks {
  pub next_token: Option<String>,
  pub page_size: u32,
}

impl RemoteCall for ListTasks {
  type Response = TaskPage;
  const OPERATION: Operation = Operation::ListTasks;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<TaskPage, RemoteError> {
    client.list_tasks(self.next_token.as_deref(), self.page_size)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSubmissions {
  pub task_id: String,
  pub statuses: Vec<SubmissionStatus>,
  pub max_results: u32,
}

impl From<&Task> for ListSubmissions {
  /// Submitted and approved work, one page
  fn from(task: &Task) -> Self {
    ListSubmissions {
      task_id: task.id.clone(),
      statuses: vec![SubmissionStatus::Submitted, SubmissionStatus::Approved],
      max_results: DEFAULT_SUBMISSION_PAGE,
    }
  }
}

impl RemoteCall for ListSubmissions {
  type Response = TaskSubmissions;
  const OPERATION: Operation = Operation::ListSubmissions;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<TaskSubmissions, RemoteError> {
    let submissions = client.list_submissions(&self.task_id, &self.statuses, self.max_results)?;

    Ok(TaskSubmissions {
      task_id: self.task_id.clone(),
      submissions,
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveSubmission {
  pub submission_id: String,
  pub feedback: String,
  pub override_rejection: bool,
}

impl From<&Submission> for ApproveSubmission {
  fn from(submission: &Submission) -> Self {
    ApproveSubmission {
      submission_id: submission.id.clone(),
      feedback: String::from(APPROVAL_FEEDBACK),
      override_rejection: false,
    }
  }
}

impl RemoteCall for ApproveSubmission {
  /// The approved submission id
  type Response = String;
  const OPERATION: Operation = Operation::ApproveSubmission;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.approve_submission(&self.submission_id, &self.feedback, self.override_rejection)?;
    Ok(self.submission_id.clone())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReviewStatus {
  pub task_id: String,
  pub revert: bool,
}

impl RemoteCall for UpdateReviewStatus {
  type Response = String;
  const OPERATION: Operation = Operation::UpdateReviewStatus;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.update_review_status(&self.task_id, self.revert)?;
    Ok(self.task_id.clone())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireTask {
  pub task_id: String,
  pub expire_at: DateTime<Utc>,
}

impl From<&Task> for ExpireTask {
  fn from(task: &Task) -> Self {
    let expire_at = Utc
      .timestamp_opt(PAST_EXPIRY_TIMESTAMP, 0)
      .single()
      .unwrap_or_else(Utc::now);

    ExpireTask {
      task_id: task.id.clone(),
      expire_at,
    }
  }
}

impl RemoteCall for ExpireTask {
  type Response = String;
  const OPERATION: Operation = Operation::ExpireTask;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.update_expiration(&self.task_id, self.expire_at)?;
    Ok(self.task_id.clone())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTask {
  pub task_id: String,
}

impl From<&Task> for DeleteTask {
  fn from(task: &Task) -> Self {
    DeleteTask {
      task_id: task.id.clone(),
    }
  }
}

impl RemoteCall for DeleteTask {
  type Response = String;
  const OPERATION: Operation = Operation::DeleteTask;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.delete_task(&self.task_id)?;
    Ok(self.task_id.clone())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateQualificationType(pub QualificationType);

impl RemoteCall for CreateQualificationType {
  type Response = String;
  const OPERATION: Operation = Operation::CreateQualificationType;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.create_qualification_type(&self.0)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrantQualification(pub QualificationGrant);

impl RemoteCall for GrantQualification {
  /// The worker granted
  type Response = String;
  const OPERATION: Operation = Operation::GrantQualification;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.grant_qualification(&self.0)?;
    Ok(self.0.worker_id.clone())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevokeQualification(pub QualificationRevocation);

impl RemoteCall for RevokeQualification {
  type Response = String;
  const OPERATION: Operation = Operation::RevokeQualification;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.revoke_qualification(&self.0)?;
    Ok(self.0.worker_id.clone())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifyWorkers(pub WorkerNotice);

impl RemoteCall for NotifyWorkers {
  /// Number of workers the notice went out to
  type Response = usize;
  const OPERATION: Operation = Operation::NotifyWorkers;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<usize, RemoteError> {
    client.notify_workers(&self.0)?;
    Ok(self.0.worker_ids.len())
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendBonus(pub Bonus);

impl RemoteCall for SendBonus {
  /// The submission the bonus was paid against
  type Response = String;
  const OPERATION: Operation = Operation::SendBonus;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<String, RemoteError> {
    client.send_bonus(&self.0)?;
    Ok(self.0.submission_id.clone())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetAccountBalance;

impl RemoteCall for GetAccountBalance {
  type Response = f64;
  const OPERATION: Operation = Operation::GetAccountBalance;

  fn call<C: MarketplaceClient>(&self, client: &mut C) -> Result<f64, RemoteError> {
    client.account_balance()
  }
}
