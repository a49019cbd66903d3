use crate::config::TaskParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything needed to post one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
  pub title: String,
  pub description: String,
  pub keywords: Vec<String>,
  pub reward: f64,
  pub max_assignments: u32,
  pub lifetime: Duration,
  pub assignment_duration: Duration,
  pub auto_approval_delay: Duration,
  pub question: String,
  /// Pixel height of the frame the question is rendered in
  pub frame_height: u32,
}

impl TaskSpec {
  pub fn from_params(params: &TaskParams, question: String) -> Self {
    TaskSpec {
      title: params.title.clone(),
      description: params.description.clone(),
      keywords: params.keywords.clone(),
      reward: params.reward,
      max_assignments: params.max_assignments,
      lifetime: params.lifetime(),
      assignment_duration: params.assignment_duration(),
      auto_approval_delay: params.auto_approval_delay(),
      question,
      frame_height: params.frame_height,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
  Assignable,
  Unassignable,
  Reviewable,
  Reviewing,
  Disposed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: String,
  pub title: String,
  pub status: TaskStatus,
  pub max_assignments: u32,
  pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
  pub tasks: Vec<Task>,
  pub next_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
  Submitted,
  Approved,
  Rejected,
}

/// One worker's submitted work on a task. `answer` is the free-text payload the task interface
/// posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
  pub id: String,
  pub task_id: String,
  pub worker_id: String,
  pub status: SubmissionStatus,
  pub answer: Option<String>,
  pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSubmissions {
  pub task_id: String,
  pub submissions: Vec<Submission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationType {
  pub name: String,
  pub description: String,
  pub keywords: Vec<String>,
  pub active: bool,
  pub retry_delay: Option<Duration>,
  pub auto_granted: bool,
  pub auto_granted_value: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationGrant {
  pub qualification_id: String,
  pub worker_id: String,
  pub value: i32,
  pub notify: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationRevocation {
  pub qualification_id: String,
  pub worker_id: String,
  pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerNotice {
  pub subject: String,
  pub message: String,
  pub worker_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
  pub worker_id: String,
  pub submission_id: String,
  pub amount: f64,
  pub reason: String,
}
