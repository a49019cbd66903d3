use batch_dispatch::DispatchError;
use std::{io, path::PathBuf};
use thiserror::Error;

/// Failure of a single marketplace call. The vendor's own taxonomy is collapsed into these three
/// shapes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
  #[error("service error {code}: {message}")]
  Service { code: String, message: String },
  #[error("request rejected: {0}")]
  Request(String),
  #[error("connection failed: {0}")]
  Connection(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("unable to read {path}: {source}")]
  Read { path: PathBuf, source: io::Error },
  #[error(transparent)]
  Yaml(#[from] serde_yaml::Error),
  #[error("no configuration file set; export {0}")]
  Unset(String),
  #[error("override path {0:?} does not exist")]
  InvalidOverride(Vec<String>),
  #[error(transparent)]
  InvalidEndpoint(#[from] url::ParseError),
  #[error("{0} is not a log level")]
  InvalidLogLevel(String),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  #[error(transparent)]
  Bincode(#[from] bincode::Error),
  #[error(transparent)]
  Yaml(#[from] serde_yaml::Error),
  #[error(transparent)]
  Decompress(#[from] lz4_flex::block::DecompressError),
  #[error("unsupported archive extension {0:?}")]
  UnsupportedFormat(String),
  #[error("{0:?} does not name a file")]
  NotAFile(PathBuf),
  #[error("no storage location configured; set experiment.storage_location")]
  StorageUnset,
  #[error(transparent)]
  Remote(#[from] RemoteError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResultsError {
  #[error("submission {submission} has a malformed answer: {reason}")]
  MalformedAnswer { submission: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RequesterError {
  #[error(transparent)]
  Dispatch(#[from] DispatchError),
  #[error(transparent)]
  Remote(#[from] RemoteError),
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error(transparent)]
  Archive(#[from] ArchiveError),
  #[error(transparent)]
  Results(#[from] ResultsError),
  #[error("no bonus amount given for worker {0}")]
  MissingBonusAmount(String),
}
