use crate::error::ConfigError;
use log::info;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use url::Url;

/// Names the variable holding the config path, as to allow several configurations side by side
pub const CONFIG_PATH_ENV: &str = "REQUESTER_CONFIG_ENV";
pub const DEFAULT_CONFIG_VAR: &str = "REQUESTER_CONFIG";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// The complete, explicit configuration for one requester session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub client: ClientParams,
  #[serde(default)]
  pub task: TaskParams,
  #[serde(default)]
  pub serialization: SerializationParams,
  pub experiment: ExperimentParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientParams {
  pub in_production: bool,
  pub n_threads: usize,
  pub profile_name: String,
  pub storage_profile_name: String,
  pub sandbox_endpoint: String,
  pub production_endpoint: String,
}

impl Default for ClientParams {
  fn default() -> Self {
    ClientParams {
      in_production: false,
      n_threads: 1,
      profile_name: String::from("requester"),
      storage_profile_name: String::from("default"),
      sandbox_endpoint: String::from("https://mturk-requester-sandbox.us-east-1.amazonaws.com"),
      production_endpoint: String::from("https://mturk-requester.us-east-1.amazonaws.com"),
    }
  }
}

impl ClientParams {
  pub fn endpoint(&self) -> Result<Url, ConfigError> {
    let endpoint = if self.in_production {
      &self.production_endpoint
    } else {
      &self.sandbox_endpoint
    };

    Ok(Url::parse(endpoint)?)
  }

  pub fn environment(&self) -> &'static str {
    if self.in_production {
      "production"
    } else {
      "sandbox"
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskParams {
  pub title: String,
  pub description: String,
  pub keywords: Vec<String>,
  pub reward: f64,
  pub max_assignments: u32,
  pub frame_height: u32,
  pub assignment_duration_hours: f64,
  pub auto_approval_delay_hours: f64,
  pub lifetime_hours: f64,
}

impl Default for TaskParams {
  fn default() -> Self {
    TaskParams {
      title: String::new(),
      description: String::new(),
      keywords: vec![],
      reward: 0.0,
      max_assignments: 1,
      frame_height: 1170,
      assignment_duration_hours: 1.0,
      auto_approval_delay_hours: 48.0,
      lifetime_hours: 12.0,
    }
  }
}

fn hours(n_hours: f64) -> Duration {
  Duration::from_secs_f64(n_hours.max(0.0) * SECONDS_PER_HOUR)
}

impl TaskParams {
  pub fn assignment_duration(&self) -> Duration {
    hours(self.assignment_duration_hours)
  }

  pub fn auto_approval_delay(&self) -> Duration {
    hours(self.auto_approval_delay_hours)
  }

  pub fn lifetime(&self) -> Duration {
    hours(self.lifetime_hours)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  Json,
  Bincode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationParams {
  pub serialize: bool,
  pub output_dir_base: PathBuf,
  pub output_format: OutputFormat,
  pub compress: bool,
}

impl Default for SerializationParams {
  fn default() -> Self {
    SerializationParams {
      serialize: true,
      output_dir_base: PathBuf::from("task_output"),
      output_format: OutputFormat::Json,
      compress: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentParams {
  pub batch_id: String,
  #[serde(default)]
  pub project_name: String,
  /// `<bucket>[/<base prefix>]` for uploaded results; empty keeps everything local
  #[serde(default)]
  pub storage_location: String,
  #[serde(default = "default_debug_level")]
  pub debug_level: String,
}

fn default_debug_level() -> String {
  String::from("info")
}

/// Replace one setting after defaults are filled in, addressed by its key path
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
  pub path: Vec<String>,
  pub value: Value,
}

impl Override {
  pub fn new<I, S, V>(path: I, value: V) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    V: Into<Value>,
  {
    Override {
      path: path.into_iter().map(Into::into).collect(),
      value: value.into(),
    }
  }

  fn invalid(&self) -> ConfigError {
    ConfigError::InvalidOverride(self.path.clone())
  }

  fn apply(&self, document: &mut Value) -> Result<(), ConfigError> {
    let (last, parents) = self.path.split_last().ok_or_else(|| self.invalid())?;

    let mut node = document;

    for key in parents {
      node = node
        .as_mapping_mut()
        .and_then(|mapping| mapping.get_mut(key.as_str()))
        .ok_or_else(|| self.invalid())?;
    }

    node
      .as_mapping_mut()
      .ok_or_else(|| self.invalid())?
      .insert(Value::from(last.as_str()), self.value.clone());

    Ok(())
  }
}

impl Config {
  pub fn from_yaml_str(raw: &str, overrides: &[Override]) -> Result<Self, ConfigError> {
    let config: Config = serde_yaml::from_str(raw)?;

    if overrides.is_empty() {
      return Ok(config);
    }

    let mut document = serde_yaml::to_value(&config)?;

    for setting in overrides {
      setting.apply(&mut document)?;
    }

    Ok(serde_yaml::from_value(document)?)
  }

  pub fn load<P: AsRef<Path>>(path: P, overrides: &[Override]) -> Result<Self, ConfigError> {
    let path = path.as_ref();

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    Config::from_yaml_str(&raw, overrides)
  }

  /// Load from the file named by `$REQUESTER_CONFIG`, or by the variable `$REQUESTER_CONFIG_ENV`
  /// names. A `.env` file is honoured
  pub fn from_env(overrides: &[Override]) -> Result<Self, ConfigError> {
    dotenv::dotenv().ok();

    let config_var = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| String::from(DEFAULT_CONFIG_VAR));
    let config_path = env::var(&config_var).map_err(|_| ConfigError::Unset(config_var.clone()))?;

    info!("using {} for task configuration", config_path);

    Config::load(config_path, overrides)
  }
}
