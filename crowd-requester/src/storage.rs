use crate::{config::Config, error::RemoteError};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSummary {
  pub key: String,
  pub size: u64,
  pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPage {
  pub objects: Vec<ObjectSummary>,
  pub next_token: Option<String>,
}

/// Object storage used to keep archived results off the local machine
pub trait ObjectStore: Sync {
  type Client: ObjectStoreClient;

  /// Sessions are opened with `client.storage_profile_name`, which may differ from the marketplace
  /// profile
  fn connect(&self, profile_name: &str) -> Result<Self::Client, RemoteError>;
}

pub trait ObjectStoreClient {
  fn put_object(&mut self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), RemoteError>;

  fn get_object(&mut self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteError>;

  /// One page of the objects under `prefix`
  fn list_objects(
    &mut self,
    bucket: &str,
    prefix: &str,
    next_token: Option<&str>,
  ) -> Result<ObjectPage, RemoteError>;
}

/// Where a batch lives in object storage: `<bucket>/<base prefix>/<project_name>/<batch_id>/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
  pub bucket: String,
  pub prefix: String,
}

impl ObjectLocation {
  /// `None` unless `experiment.storage_location` names at least a bucket
  pub fn from_config(config: &Config) -> Option<Self> {
    let experiment = &config.experiment;
    let mut segments = experiment
      .storage_location
      .split('/')
      .filter(|segment| !segment.is_empty());

    let bucket = segments.next()?.to_string();

    let prefix = segments
      .chain(vec![experiment.project_name.as_str(), experiment.batch_id.as_str()])
      .filter(|segment| !segment.is_empty())
      .join("/");

    Some(ObjectLocation { bucket, prefix })
  }

  pub fn key(&self, name: &str) -> String {
    if self.prefix.is_empty() {
      name.to_string()
    } else {
      format!("{}/{}", self.prefix, name)
    }
  }
}

/// Every object under `location`, oldest first
pub fn list_location<C: ObjectStoreClient>(
  client: &mut C,
  location: &ObjectLocation,
) -> Result<Vec<ObjectSummary>, RemoteError> {
  let mut objects = vec![];
  let mut next_token: Option<String> = None;

  loop {
    let page = client.list_objects(&location.bucket, &location.prefix, next_token.as_deref())?;

    objects.extend(page.objects);

    match page.next_token {
      Some(token) => next_token = Some(token),
      None => break,
    }
  }

  objects.sort_by_key(|object| object.last_modified);

  Ok(objects)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(storage_location: &str, project_name: &str) -> Config {
    let raw = format!(
      "experiment:\n  batch_id: batch_7\n  project_name: '{}'\n  storage_location: '{}'\n",
      project_name, storage_location
    );

    Config::from_yaml_str(&raw, &[]).unwrap()
  }

  #[test]
  fn it_builds_object_keys() {
    let location =
      ObjectLocation::from_config(&config("crowd-bucket/results/2021", "signs")).unwrap();

    assert_eq!(location.bucket, "crowd-bucket");
    assert_eq!(location.prefix, "results/2021/signs/batch_7");
    assert_eq!(location.key("log.txt"), "results/2021/signs/batch_7/log.txt");
  }

  #[test]
  fn it_skips_empty_segments() {
    let location = ObjectLocation::from_config(&config("crowd-bucket", "")).unwrap();

    assert_eq!(location.prefix, "batch_7");
    assert_eq!(location.key("log.txt"), "batch_7/log.txt");
  }

  #[test]
  fn it_requires_a_bucket() {
    assert_eq!(ObjectLocation::from_config(&config("", "signs")), None);
  }
}
