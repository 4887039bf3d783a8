//! Configuration for the customer report job.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::JobError;

/// Main configuration for the batch job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Job identity, chunking, and schedule
    #[serde(default)]
    pub job: JobConfig,

    /// Input configuration
    #[serde(default)]
    pub input: InputConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Filter stage settings
    #[serde(default)]
    pub filters: FilterSettings,
}

/// Job identity, chunk size, and schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name used as the execution registry key
    #[serde(default = "default_job_name")]
    pub name: String,

    /// Number of kept records committed to the sink per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Fixed tick interval between scheduled runs, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: default_job_name(),
            chunk_size: default_chunk_size(),
            interval_secs: default_interval_secs(),
        }
    }
}

/// Input data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the JSON customer file decoded at the start of every run
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

/// Output report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the report file, rewritten by each run (one record per line)
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

/// Settings for the built-in filter stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Customers with at least this many transactions are dropped
    #[serde(default = "default_transaction_limit")]
    pub transaction_limit: u32,

    /// Window the birthday eligibility stage matches against
    #[serde(default)]
    pub birthday_window: BirthdayWindow,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            transaction_limit: default_transaction_limit(),
            birthday_window: BirthdayWindow::default(),
        }
    }
}

/// Birthday eligibility window, evaluated against a reference date.
///
/// The birth year is always ignored; only the position in the calendar
/// matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthdayWindow {
    /// Birthday falls in the same calendar month as the reference date
    #[default]
    SameMonth,

    /// Birthday falls on the same month and day as the reference date
    SameDay,

    /// Birthday falls within this many calendar days of the reference date,
    /// wrapping around the year boundary
    WithinDays { days: u32 },
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "json" => serde_json::from_str(&contents)?,
            // YAML is a superset of JSON, so it is also the fallback
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The tick interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.job.interval_secs)
    }

    /// Validate the configuration, failing fast before any run starts.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.job.name.trim().is_empty() {
            return Err(JobError::Configuration("job name must not be empty".into()));
        }
        if self.job.chunk_size == 0 {
            return Err(JobError::Configuration("chunk size must be > 0".into()));
        }
        if self.job.interval_secs == 0 {
            return Err(JobError::Configuration(
                "tick interval must be > 0 seconds".into(),
            ));
        }
        if let BirthdayWindow::WithinDays { days } = self.filters.birthday_window {
            if days > 366 {
                return Err(JobError::Configuration(format!(
                    "birthday window of {days} days exceeds a full year"
                )));
            }
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_job_name() -> String {
    "customer-report".to_string()
}
fn default_chunk_size() -> usize {
    20
}
fn default_interval_secs() -> u64 {
    5
}
fn default_input_path() -> PathBuf {
    PathBuf::from("customers.json")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("output.txt")
}
fn default_transaction_limit() -> u32 {
    5
}
