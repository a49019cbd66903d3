use crate::{
  call::Operation,
  config::{Config, OutputFormat},
  error::ArchiveError,
  storage::{list_location, ObjectLocation, ObjectStore, ObjectStoreClient, ObjectSummary},
};
use chrono::Local;
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::ser::PrettyFormatter;
use std::{
  ffi::OsStr,
  fs,
  path::{Path, PathBuf},
};

const JSON_EXT: &str = "json";
const BINCODE_EXT: &str = "bin";
const COMPRESSED_EXT: &str = "lz4";
const SANDBOX_PREFIX: &str = "sbx";

/// Writes action results and run records under `<output_dir_base>/<batch_id>/`, optionally mirrored
/// to object storage
#[derive(Debug, Clone)]
pub struct Archive {
  output_dir: PathBuf,
  sandbox: bool,
  enabled: bool,
  format: OutputFormat,
  compress: bool,
  storage: Option<ObjectLocation>,
  storage_profile: String,
}

fn timestamp() -> String {
  Local::now()
    .format("%Y_%b_%-d_%H_%M")
    .to_string()
    .to_lowercase()
}

fn with_extension(path: PathBuf, ext: &str) -> PathBuf {
  let mut name = path.into_os_string();
  name.push(".");
  name.push(ext);
  PathBuf::from(name)
}

fn encode<T: Serialize>(
  value: &T,
  format: OutputFormat,
  compress: bool,
) -> Result<Vec<u8>, ArchiveError> {
  let data = match format {
    OutputFormat::Json if compress => serde_json::to_vec(value)?,
    OutputFormat::Json => {
      let mut data = vec![];
      let formatter = PrettyFormatter::with_indent(b"    ");
      let mut serializer = serde_json::Serializer::with_formatter(&mut data, formatter);
      value.serialize(&mut serializer)?;
      data
    }
    OutputFormat::Bincode => bincode::serialize(value)?,
  };

  if compress {
    Ok(lz4_flex::block::compress_prepend_size(&data))
  } else {
    Ok(data)
  }
}

fn extension(path: &Path) -> Option<&str> {
  path.extension().and_then(OsStr::to_str)
}

/// The format is taken from the extension of `name`
fn decode<T: DeserializeOwned>(name: &Path, data: Vec<u8>) -> Result<T, ArchiveError> {
  let (inner, data) = if extension(name) == Some(COMPRESSED_EXT) {
    (
      name.with_extension(""),
      lz4_flex::block::decompress_size_prepended(&data)?,
    )
  } else {
    (name.to_path_buf(), data)
  };

  match extension(&inner) {
    Some(JSON_EXT) => Ok(serde_json::from_slice(&data)?),
    Some(BINCODE_EXT) => Ok(bincode::deserialize(&data)?),
    other => Err(ArchiveError::UnsupportedFormat(
      other.unwrap_or_default().to_string(),
    )),
  }
}

/// Read back anything [`Archive::write`] produced
pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ArchiveError> {
  let path = path.as_ref();

  decode(path, fs::read(path)?)
}

impl Archive {
  pub fn new(config: &Config) -> Self {
    Archive {
      output_dir: config
        .serialization
        .output_dir_base
        .join(&config.experiment.batch_id),
      sandbox: !config.client.in_production,
      enabled: config.serialization.serialize,
      format: config.serialization.output_format,
      compress: config.serialization.compress,
      storage: ObjectLocation::from_config(config),
      storage_profile: config.client.storage_profile_name.clone(),
    }
  }

  pub fn output_dir(&self) -> &Path {
    &self.output_dir
  }

  /// `[sbx--]<label>[--<timestamp>]` inside the batch directory, which is created on demand
  pub fn output_path(&self, label: &str, include_timestamp: bool) -> Result<PathBuf, ArchiveError> {
    fs::create_dir_all(&self.output_dir)?;

    let stamp = if include_timestamp {
      Some(timestamp())
    } else {
      None
    };

    let file_name = [
      if self.sandbox {
        Some(SANDBOX_PREFIX)
      } else {
        None
      },
      Some(label),
      stamp.as_deref(),
    ]
    .iter()
    .flatten()
    .copied()
    .collect::<Vec<&str>>()
    .join("--");

    Ok(self.output_dir.join(file_name))
  }

  fn file_path(&self, label: &str) -> Result<PathBuf, ArchiveError> {
    let path = self.output_path(label, true)?;

    let path = match self.format {
      OutputFormat::Json => with_extension(path, JSON_EXT),
      OutputFormat::Bincode => with_extension(path, BINCODE_EXT),
    };

    if self.compress {
      Ok(with_extension(path, COMPRESSED_EXT))
    } else {
      Ok(path)
    }
  }

  /// Returns where `value` was written, or `None` when `serialization.serialize` is off
  pub fn write<T: Serialize>(
    &self,
    label: &str,
    value: &T,
  ) -> Result<Option<PathBuf>, ArchiveError> {
    if !self.enabled {
      debug!("serialization disabled; {} not written", label);
      return Ok(None);
    }

    let path = self.file_path(label)?;

    fs::write(&path, encode(value, self.format, self.compress)?)?;

    info!("{} written to {}", label, path.display());

    Ok(Some(path))
  }

  pub fn write_result<T: Serialize>(
    &self,
    operation: Operation,
    value: &T,
  ) -> Result<Option<PathBuf>, ArchiveError> {
    self.write(&format!("result--{}", operation), value)
  }

  pub fn record_input<T: Serialize>(&self, data: &T) -> Result<Option<PathBuf>, ArchiveError> {
    self.write("record--input_data", data)
  }

  /// Keep a YAML copy of the effective configuration next to the results of `action`
  pub fn record_config(
    &self,
    action: &str,
    config: &Config,
  ) -> Result<Option<PathBuf>, ArchiveError> {
    if !self.enabled {
      debug!("serialization disabled; configuration for {} not recorded", action);
      return Ok(None);
    }

    let path = with_extension(
      self.output_path(&format!("record--config--{}", action), true)?,
      "yml",
    );

    fs::write(&path, serde_yaml::to_string(config)?)?;

    info!("configuration for {} recorded at {}", action, path.display());

    Ok(Some(path))
  }

  fn storage(&self) -> Result<&ObjectLocation, ArchiveError> {
    self.storage.as_ref().ok_or(ArchiveError::StorageUnset)
  }

  /// Copy a local file into the batch's storage folder under its own file name; returns the object
  /// key
  pub fn upload<S: ObjectStore>(&self, store: &S, path: &Path) -> Result<String, ArchiveError> {
    let location = self.storage()?;

    let name = path
      .file_name()
      .and_then(OsStr::to_str)
      .ok_or_else(|| ArchiveError::NotAFile(path.to_path_buf()))?;

    let key = location.key(name);
    let mut client = store.connect(&self.storage_profile)?;

    client.put_object(&location.bucket, &key, fs::read(path)?)?;

    info!("uploaded {} to {}/{}", path.display(), location.bucket, key);

    Ok(key)
  }

  /// Fetch and decode an object previously uploaded from this batch
  pub fn download<S: ObjectStore, T: DeserializeOwned>(
    &self,
    store: &S,
    name: &str,
  ) -> Result<T, ArchiveError> {
    let location = self.storage()?;
    let mut client = store.connect(&self.storage_profile)?;

    let data = client.get_object(&location.bucket, &location.key(name))?;

    decode(Path::new(name), data)
  }

  /// Everything stored for this batch, oldest first
  pub fn list_working_folder<S: ObjectStore>(
    &self,
    store: &S,
  ) -> Result<Vec<ObjectSummary>, ArchiveError> {
    let location = self.storage()?;
    let mut client = store.connect(&self.storage_profile)?;

    Ok(list_location(&mut client, location)?)
  }
}
