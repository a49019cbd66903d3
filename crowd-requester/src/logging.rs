use crate::{
  archive::Archive,
  config::Config,
  error::{ArchiveError, ConfigError, RequesterError},
};
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::{
  env,
  fs::{File, OpenOptions},
  io::{LineWriter, Write},
  path::{Path, PathBuf},
};

/// Kept next to the batch's archived results, without a timestamp so reruns append
pub const LOG_FILE: &str = "log.txt";

pub fn level_filter(level: &str) -> Result<LevelFilter, ConfigError> {
  match level.to_ascii_lowercase().as_str() {
    "off" => Ok(LevelFilter::Off),
    "error" => Ok(LevelFilter::Error),
    "warn" | "warning" => Ok(LevelFilter::Warn),
    "info" => Ok(LevelFilter::Info),
    "debug" => Ok(LevelFilter::Debug),
    "trace" => Ok(LevelFilter::Trace),
    _ => Err(ConfigError::InvalidLogLevel(level.to_string())),
  }
}

/// Writes every record that passes the console filter to both the console and the run's log file
pub struct RunLogger {
  console: env_logger::Logger,
  file: Mutex<LineWriter<File>>,
}

impl RunLogger {
  /// Console output is timestamped by `pretty_env_logger`; `RUST_LOG` directives take precedence
  /// over `level`
  pub fn new(level: LevelFilter, log_path: &Path) -> Result<Self, ArchiveError> {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(level);

    if let Ok(filters) = env::var("RUST_LOG") {
      builder.parse_filters(&filters);
    }

    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(log_path)?;

    Ok(RunLogger {
      console: builder.build(),
      file: Mutex::new(LineWriter::new(file)),
    })
  }

  pub fn filter(&self) -> LevelFilter {
    self.console.filter()
  }
}

impl Log for RunLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    self.console.enabled(metadata)
  }

  fn log(&self, record: &Record) {
    if !self.console.matches(record) {
      return;
    }

    self.console.log(record);

    let mut file = self.file.lock();

    // write failures are dropped; the console copy still goes out
    writeln!(
      file,
      "{}: {}: {} \t[{}: {}]",
      Local::now().format("%m/%d %I:%M:%S"),
      record.level(),
      record.args(),
      record.file().unwrap_or_else(|| record.target()),
      record.line().unwrap_or(0)
    )
    .ok();
  }

  fn flush(&self) {
    self.console.flush();
    self.file.lock().flush().ok();
  }
}

/// Install the run logger at the configured level, writing to `[sbx--]log.txt` in the batch output
/// directory. Calling this more than once keeps the first logger
pub fn init(config: &Config) -> Result<PathBuf, RequesterError> {
  let level = level_filter(&config.experiment.debug_level)?;
  let log_path = Archive::new(config).output_path(LOG_FILE, false)?;

  let logger = RunLogger::new(level, &log_path)?;
  let max_level = logger.filter();

  if log::set_boxed_logger(Box::new(logger)).is_ok() {
    log::set_max_level(max_level);
  }

  Ok(log_path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Override;
  use log::Level;
  use std::fs;

  fn config(dir: &Path) -> Config {
    let raw = format!(
      "experiment:\n  batch_id: logging\n  debug_level: debug\n\
       serialization:\n  output_dir_base: {}\n",
      dir.display()
    );

    Config::from_yaml_str(&raw, &[]).unwrap()
  }

  #[test]
  fn it_maps_configured_levels() {
    assert_eq!(level_filter("warning").unwrap(), LevelFilter::Warn);
    assert_eq!(level_filter("DEBUG").unwrap(), LevelFilter::Debug);
    assert!(matches!(
      level_filter("verbose"),
      Err(ConfigError::InvalidLogLevel(level)) if level == "verbose"
    ));
  }

  #[test]
  fn it_writes_records_to_the_run_log() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join(LOG_FILE);
    let logger = RunLogger::new(LevelFilter::Info, &log_path)?;

    logger.log(
      &Record::builder()
        .args(format_args!("performed {}/{} create_task actions", 4, 5))
        .level(Level::Info)
        .target("crowd_requester")
        .file(Some("requester.rs"))
        .line(Some(108))
        .build(),
    );

    logger.log(
      &Record::builder()
        .args(format_args!("worker 1 finished"))
        .level(Level::Trace)
        .target("crowd_requester")
        .build(),
    );

    logger.flush();

    let written = fs::read_to_string(&log_path)?;

    assert_eq!(written.lines().count(), 1);
    assert!(written.contains(": INFO: performed 4/5 create_task actions \t[requester.rs: 108]"));

    Ok(())
  }

  #[test]
  fn it_logs_next_to_the_batch_results() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = config(dir.path());

    let log_path = init(&config)?;

    assert_eq!(log_path, dir.path().join("logging").join("sbx--log.txt"));
    assert!(log_path.is_file());
    assert!(init(&config).is_ok());

    Ok(())
  }

  #[test]
  fn it_rejects_unknown_levels_before_touching_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = Config::from_yaml_str(
      &format!(
        "experiment:\n  batch_id: logging\nserialization:\n  output_dir_base: {}\n",
        dir.path().display()
      ),
      &[Override::new(vec!["experiment", "debug_level"], "loud")],
    )?;

    assert!(matches!(
      init(&config),
      Err(RequesterError::Config(ConfigError::InvalidLogLevel(_)))
    ));
    assert!(!dir.path().join("logging").exists());

    Ok(())
  }
}
