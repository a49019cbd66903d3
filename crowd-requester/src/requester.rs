use crate::{
  call::{
    ApproveSubmission, CreateQualificationType, CreateTask, DeleteTask, ExpireTask,
    GetAccountBalance, GetTask, GrantQualification, ListSubmissions, ListTasks, NotifyWorkers,
    RemoteCall, RevokeQualification, SendBonus, UpdateReviewStatus,
  },
  config::Config,
  cost::{self, CostEstimate},
  error::{RemoteError, RequesterError},
  marketplace::Marketplace,
  model::{
    Bonus, QualificationGrant, QualificationRevocation, QualificationType, SubmissionStatus, Task,
    TaskSpec, TaskStatus, TaskSubmissions, WorkerNotice,
  },
  results::{extract_responses, ExtractedResults},
};
use batch_dispatch::{batch::bucket_count, partition, DispatchReport, Dispatcher};
use itertools::Itertools;
use log::{info, warn};
use std::collections::BTreeMap;

/// Outcome of performing one kind of call over many items
pub type CallReport<C> = DispatchReport<C, <C as RemoteCall>::Response, RemoteError>;

/// The marketplace caps how many workers one notice may address
pub const MAX_WORKERS_PER_NOTICE: usize = 100;
const TASK_PAGE_SIZE: u32 = 100;

/// Both passes of a forced deletion
#[derive(Debug)]
pub struct DeletionReport {
  pub expired: CallReport<ExpireTask>,
  pub deleted: CallReport<DeleteTask>,
}

impl DeletionReport {
  pub fn is_complete(&self) -> bool {
    self.expired.is_complete() && self.deleted.is_complete()
  }
}

/// Requester-side actions against a [`Marketplace`], configured explicitly at construction
pub struct Requester<M: Marketplace> {
  marketplace: M,
  config: Config,
}

impl<M> Requester<M>
where
  M: Marketplace,
{
  pub fn new(marketplace: M, config: Config) -> Self {
    Requester {
      marketplace,
      config,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  fn perform_with<C: RemoteCall>(
    &self,
    dispatcher: Dispatcher,
    calls: Vec<C>,
  ) -> Result<CallReport<C>, RequesterError> {
    let Requester {
      marketplace,
      config,
    } = self;

    let report = dispatcher.with_label(C::OPERATION.name()).dispatch_with_session(
      calls,
      || marketplace.connect(&config.client),
      |client: &mut M::Client, call: &C| call.call(client),
    )?;

    Ok(report)
  }

  /// Fan calls out over `client.n_threads` workers, each with its own session
  pub fn perform_multi<C: RemoteCall>(
    &self,
    calls: Vec<C>,
  ) -> Result<CallReport<C>, RequesterError> {
    let dispatcher = Dispatcher::new(self.config.client.n_threads)?;

    self.perform_with(dispatcher, calls)
  }

  /// Perform calls one after another on a single session
  pub fn perform_serial<C: RemoteCall>(
    &self,
    calls: Vec<C>,
  ) -> Result<CallReport<C>, RequesterError> {
    self.perform_with(Dispatcher::serial(), calls)
  }

  pub fn perform_single<C: RemoteCall>(&self, call: C) -> Result<C::Response, RequesterError> {
    let mut client = self.marketplace.connect(&self.config.client)?;
    let response = call.call(&mut client)?;

    info!("performed {} action", C::OPERATION);

    Ok(response)
  }

  /// Post one task per rendered question, using the configured task parameters
  pub fn create_tasks(
    &self,
    questions: Vec<String>,
  ) -> Result<CallReport<CreateTask>, RequesterError> {
    let specs = questions
      .into_iter()
      .map(|question| TaskSpec::from_params(&self.config.task, question))
      .collect_vec();

    self.create_tasks_from_specs(specs)
  }

  pub fn create_tasks_from_specs(
    &self,
    specs: Vec<TaskSpec>,
  ) -> Result<CallReport<CreateTask>, RequesterError> {
    self.perform_multi(specs.into_iter().map(CreateTask).collect_vec())
  }

  pub fn refresh_tasks(&self, tasks: &[Task]) -> Result<CallReport<GetTask>, RequesterError> {
    self.perform_multi(tasks.iter().map(GetTask::from).collect_vec())
  }

  /// Current status of each task, paired with its id
  pub fn task_statuses(&self, tasks: &[Task]) -> Result<Vec<(String, TaskStatus)>, RequesterError> {
    let statuses = self
      .refresh_tasks(tasks)?
      .map_responses(|task| (task.id, task.status))
      .into_result()?;

    Ok(statuses)
  }

  pub fn assignable_tasks(&self, tasks: &[Task]) -> Result<Vec<Task>, RequesterError> {
    let refreshed = self.refresh_tasks(tasks)?.into_result()?;

    Ok(
      refreshed
        .into_iter()
        .filter(|task| task.status == TaskStatus::Assignable)
        .collect_vec(),
    )
  }

  /// Page through every task on the account. Slow for accounts with many thousands of tasks
  pub fn list_all_tasks(&self) -> Result<Vec<Task>, RequesterError> {
    let mut client = self.marketplace.connect(&self.config.client)?;
    let mut tasks = vec![];
    let mut next_token = None;

    loop {
      let page = ListTasks {
        next_token: next_token.take(),
        page_size: TASK_PAGE_SIZE,
      }
      .call(&mut client)?;

      tasks.extend(page.tasks);

      match page.next_token {
        Some(token) => next_token = Some(token),
        None => break,
      }
    }

    info!("listed {} tasks", tasks.len());

    Ok(tasks)
  }

  pub fn list_submissions(
    &self,
    tasks: &[Task],
  ) -> Result<CallReport<ListSubmissions>, RequesterError> {
    self.perform_multi(tasks.iter().map(ListSubmissions::from).collect_vec())
  }

  /// Retrieve submissions and group their answers by item
  pub fn extract_results(&self, tasks: &[Task]) -> Result<ExtractedResults, RequesterError> {
    let submissions = self.list_submissions(tasks)?.into_result()?;

    Ok(extract_responses(&submissions)?)
  }

  /// Approve every submission still awaiting review; already approved or rejected work is left
  /// alone
  pub fn approve_submissions(
    &self,
    task_submissions: &[TaskSubmissions],
  ) -> Result<CallReport<ApproveSubmission>, RequesterError> {
    let calls = task_submissions
      .iter()
      .flat_map(|task| &task.submissions)
      .filter(|submission| submission.status == SubmissionStatus::Submitted)
      .map(ApproveSubmission::from)
      .collect_vec();

    self.perform_multi(calls)
  }

  pub fn approve_tasks(
    &self,
    tasks: &[Task],
  ) -> Result<CallReport<ApproveSubmission>, RequesterError> {
    let submissions = self.list_submissions(tasks)?.into_result()?;

    self.approve_submissions(&submissions)
  }

  pub fn set_reviewing(
    &self,
    tasks: &[Task],
    revert: bool,
  ) -> Result<CallReport<UpdateReviewStatus>, RequesterError> {
    let calls = tasks
      .iter()
      .map(|task| UpdateReviewStatus {
        task_id: task.id.clone(),
        revert,
      })
      .collect_vec();

    self.perform_multi(calls)
  }

  pub fn expire_tasks(&self, tasks: &[Task]) -> Result<CallReport<ExpireTask>, RequesterError> {
    self.perform_multi(tasks.iter().map(ExpireTask::from).collect_vec())
  }

  /// Permanently remove tasks. Tasks already disposed of are skipped
  pub fn delete_tasks(&self, tasks: &[Task]) -> Result<CallReport<DeleteTask>, RequesterError> {
    let calls = tasks
      .iter()
      .filter(|task| task.status != TaskStatus::Disposed)
      .map(DeleteTask::from)
      .collect_vec();

    self.perform_multi(calls)
  }

  /// Expire then delete, so tasks still open to workers can be removed
  pub fn force_delete_tasks(
    &self,
    tasks: &[Task],
    force: bool,
  ) -> Result<DeletionReport, RequesterError> {
    if self.config.client.in_production && !force {
      warn!(
        "deleting {} tasks in production; pass force to acknowledge",
        tasks.len()
      );
    }

    let expired = self.expire_tasks(tasks)?;
    let deleted = self.delete_tasks(tasks)?;

    Ok(DeletionReport { expired, deleted })
  }

  pub fn create_qualification_type(
    &self,
    qualification: QualificationType,
  ) -> Result<String, RequesterError> {
    self.perform_single(CreateQualificationType(qualification))
  }

  pub fn grant_qualification(
    &self,
    qualification_id: &str,
    worker_ids: &[String],
    notify: bool,
  ) -> Result<CallReport<GrantQualification>, RequesterError> {
    info!("granting {} to {} workers", qualification_id, worker_ids.len());

    let calls = worker_ids
      .iter()
      .map(|worker_id| {
        GrantQualification(QualificationGrant {
          qualification_id: qualification_id.to_string(),
          worker_id: worker_id.clone(),
          value: 1,
          notify,
        })
      })
      .collect_vec();

    self.perform_serial(calls)
  }

  pub fn revoke_qualification(
    &self,
    qualification_id: &str,
    worker_ids: &[String],
    reason: &str,
  ) -> Result<CallReport<RevokeQualification>, RequesterError> {
    info!("revoking {} for {} workers", qualification_id, worker_ids.len());

    let calls = worker_ids
      .iter()
      .map(|worker_id| {
        RevokeQualification(QualificationRevocation {
          qualification_id: qualification_id.to_string(),
          worker_id: worker_id.clone(),
          reason: reason.to_string(),
        })
      })
      .collect_vec();

    self.perform_serial(calls)
  }

  /// Message workers, splitting the recipients round-robin into notices of at most
  /// [`MAX_WORKERS_PER_NOTICE`]
  pub fn notify_workers(
    &self,
    worker_ids: Vec<String>,
    subject: &str,
    message: &str,
  ) -> Result<CallReport<NotifyWorkers>, RequesterError> {
    let notice_count = bucket_count(worker_ids.len(), MAX_WORKERS_PER_NOTICE);

    let calls = if notice_count.eq(&0) {
      vec![]
    } else {
      partition(worker_ids, notice_count)
        .into_iter()
        .map(|batch| {
          NotifyWorkers(WorkerNotice {
            subject: subject.to_string(),
            message: message.to_string(),
            worker_ids: batch.items,
          })
        })
        .collect_vec()
    };

    self.perform_serial(calls)
  }

  /// Pay each worker their amount once per listed submission. Every worker must have an amount
  /// before anything is paid
  pub fn send_bonuses(
    &self,
    submissions_by_worker: &BTreeMap<String, Vec<String>>,
    amounts: &BTreeMap<String, f64>,
    reason: &str,
  ) -> Result<CallReport<SendBonus>, RequesterError> {
    let mut calls = vec![];

    for (worker_id, submission_ids) in submissions_by_worker {
      let amount = *amounts
        .get(worker_id)
        .ok_or_else(|| RequesterError::MissingBonusAmount(worker_id.clone()))?;

      calls.extend(submission_ids.iter().map(|submission_id| {
        SendBonus(Bonus {
          worker_id: worker_id.clone(),
          submission_id: submission_id.clone(),
          amount,
          reason: reason.to_string(),
        })
      }));
    }

    let total: f64 = calls.iter().map(|SendBonus(bonus)| bonus.amount).sum();

    info!("paying ${:.2} of bonuses across {} submissions", total, calls.len());

    self.perform_serial(calls)
  }

  pub fn account_balance(&self) -> Result<f64, RequesterError> {
    self.perform_single(GetAccountBalance)
  }

  /// Price a batch of `item_count` tasks against the current balance
  pub fn estimate_cost(&self, item_count: usize) -> Result<CostEstimate, RequesterError> {
    let balance = self.account_balance()?;
    let task = &self.config.task;

    let estimate = cost::estimate(item_count, task.reward, task.max_assignments, balance);

    match estimate.shortfall() {
      Some(shortfall) => warn!(
        "insufficient funds: batch will cost ${:.2} and only ${:.2} is available; \
         ${:.2} more is needed",
        estimate.total, balance, shortfall
      ),
      None => info!(
        "batch will cost ${:.2} of ${:.2} available in {}",
        estimate.total,
        balance,
        self.config.client.environment()
      ),
    }

    Ok(estimate)
  }
}
