//! Input discovery and case/task subset selection

use crate::config::{InputConfig, SelectionConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("No column '{column}' in {path:?}")]
    MissingColumn { column: String, path: PathBuf },

    #[error(
        "No trace logs selected from {dir:?}. Check the case/task lists or disable subset selection."
    )]
    NothingSelected { dir: PathBuf },
}

/// All trace logs in the input directory, sorted by path
pub fn discover_files(input: &InputConfig) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(&input.dir)
        .with_context(|| format!("Failed to read input directory: {:?}", input.dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(&input.suffix))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    log::info!("Found {} trace logs in {:?}", files.len(), input.dir);
    Ok(files)
}

/// Values of one named column of a CSV file
pub fn read_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open selection list: {:?}", path))?;

    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| SelectionError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read {:?}", path))?;
        if let Some(value) = record.get(index).map(str::trim).filter(|v| !v.is_empty()) {
            values.push(value.to_string());
        }
    }
    Ok(values)
}

/// Case and task filters; `None` means no filtering on that axis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub cases: Option<Vec<String>>,
    pub tasks: Option<Vec<String>>,
}

impl Selection {
    /// Load the lists enabled in the configuration
    pub fn load(config: &SelectionConfig) -> Result<Self> {
        let cases = if config.subset_cases {
            Some(read_column(&config.cases_file, "ID")?)
        } else {
            None
        };
        let tasks = if config.subset_tasks {
            Some(read_column(&config.tasks_file, "tasks")?)
        } else {
            None
        };
        Ok(Self { cases, tasks })
    }

    /// A file is selected when its name contains a listed case and/or task
    pub fn matches(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        let contains_any = |list: &Option<Vec<String>>| match list {
            Some(values) => values.iter().any(|v| name.contains(v.as_str())),
            None => true,
        };
        contains_any(&self.cases) && contains_any(&self.tasks)
    }

    pub fn apply(&self, files: Vec<PathBuf>) -> Vec<PathBuf> {
        files.into_iter().filter(|f| self.matches(f)).collect()
    }
}
