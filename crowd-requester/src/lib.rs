//! Requester-side tooling for crowdsourcing marketplaces: post tasks, collect and approve work,
//! manage workers, and keep a record of every run.
//!
//! Calls against the marketplace fan out over `client.n_threads` workers, each holding its own
//! [`MarketplaceClient`] session. Individual call failures are logged and handed back in the
//! returned report rather than aborting the batch.
//!
//! ```rust,ignore
//! let config = Config::from_env(&[Override::new(vec!["client", "n_threads"], 4u64)])?;
//! let log_path = logging::init(&config)?;
//!
//! let requester = Requester::new(marketplace, config);
//! let estimate = requester.estimate_cost(questions.len())?;
//!
//! if estimate.is_affordable() {
//!   let created = requester.create_tasks(questions)?;
//!   let archive = Archive::new(requester.config());
//!
//!   if let Some(path) = archive.write_result(Operation::CreateTask, &created.responses)? {
//!     archive.upload(&object_store, &path)?;
//!     archive.upload(&object_store, &log_path)?;
//!   }
//! }
//! ```

pub mod archive;
pub mod call;
pub mod config;
pub mod cost;
mod error;
pub mod logging;
pub mod marketplace;
pub mod model;
mod requester;
pub mod results;
pub mod storage;
#[cfg(test)]
mod testing;

pub use archive::Archive;
pub use call::{Operation, RemoteCall};
pub use config::{Config, Override};
pub use cost::CostEstimate;
pub use error::{ArchiveError, ConfigError, RemoteError, RequesterError, ResultsError};
pub use marketplace::{Marketplace, MarketplaceClient};
pub use requester::{CallReport, DeletionReport, Requester, MAX_WORKERS_PER_NOTICE};
pub use results::{extract_responses, ExtractedResults};
pub use storage::{ObjectLocation, ObjectStore, ObjectStoreClient};
