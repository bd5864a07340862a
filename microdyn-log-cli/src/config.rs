//! Configuration loading and parsing

use anyhow::{Context, Result};
use microdyn_log_decoder::ParserConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Directory holding the trace logs
    #[serde(default = "default_input_dir")]
    pub dir: PathBuf,
    /// File name suffix of trace logs
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_suffix() -> String {
    "_scoring.xml".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: default_input_dir(),
            suffix: default_suffix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Write the action stream
    #[serde(default = "default_true")]
    pub actions: bool,
    /// Write the wide (one row per subject) table
    #[serde(default)]
    pub wide: bool,
    /// Write the JSON batch report
    #[serde(default = "default_true")]
    pub batch_report: bool,
    /// File name prefix; defaults to the test identifier of the logs
    #[serde(default)]
    pub prefix: Option<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            actions: true,
            wide: false,
            batch_report: true,
            prefix: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectionConfig {
    /// Only process files of the cases listed in `cases_file`
    #[serde(default)]
    pub subset_cases: bool,
    /// Only process files of the tasks listed in `tasks_file`
    #[serde(default)]
    pub subset_tasks: bool,
    /// CSV with an `ID` column
    #[serde(default = "default_cases_file")]
    pub cases_file: PathBuf,
    /// CSV with a `tasks` column
    #[serde(default = "default_tasks_file")]
    pub tasks_file: PathBuf,
}

fn default_cases_file() -> PathBuf {
    PathBuf::from("info/IDs.csv")
}

fn default_tasks_file() -> PathBuf {
    PathBuf::from("info/tasks.csv")
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            subset_cases: false,
            subset_tasks: false,
            cases_file: default_cases_file(),
            tasks_file: default_tasks_file(),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
