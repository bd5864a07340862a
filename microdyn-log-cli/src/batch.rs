//! Batch processing of many trace logs
//!
//! Files are decoded independently and in parallel. A file that fails to
//! decode is logged and counted, never fatal for the batch. Results are
//! concatenated and sorted so the output does not depend on scheduling.

use microdyn_log_decoder::{ActionRecord, AggregateRecord, LogParser};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

/// A file that could not be decoded
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Concatenated results of a batch run
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub actions: Vec<ActionRecord>,
    pub aggregates: Vec<AggregateRecord>,
    pub processed: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    /// Test identifier of the first successfully decoded file
    pub test: Option<String>,
}

/// Counts written to the JSON batch report
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub decoder_version: String,
    pub test: Option<String>,
    pub files_selected: usize,
    pub files_processed: usize,
    pub action_records: usize,
    pub aggregate_records: usize,
    pub processed: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    pub fn report(&self) -> BatchReport {
        BatchReport {
            decoder_version: microdyn_log_decoder::VERSION.to_string(),
            test: self.test.clone(),
            files_selected: self.processed.len() + self.failures.len(),
            files_processed: self.processed.len(),
            action_records: self.actions.len(),
            aggregate_records: self.aggregates.len(),
            processed: self.processed.clone(),
            failures: self.failures.clone(),
        }
    }
}

/// Decode all files and merge their records
pub fn run_batch(parser: &LogParser, files: &[PathBuf]) -> BatchOutcome {
    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, parser.parse_file(path)))
        .collect();

    let mut outcome = BatchOutcome::default();
    // `results` keeps the (sorted) input order, so "first file" is stable
    for (path, result) in results {
        match result {
            Ok(parsed) => {
                log::debug!(
                    "{:?}: {} actions, {} aggregates",
                    path,
                    parsed.actions.len(),
                    parsed.aggregates.len()
                );
                if outcome.test.is_none() {
                    outcome.test = Some(parsed.properties.test.clone());
                }
                outcome.actions.extend(parsed.actions);
                outcome.aggregates.extend(parsed.aggregates);
                outcome.processed.push(path.clone());
            }
            Err(e) => {
                log::warn!("Skipping {:?}: {}", path, e);
                outcome.failures.push(FileFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    sort_actions(&mut outcome.actions);
    sort_aggregates(&mut outcome.aggregates);

    log::info!(
        "Decoded {} of {} files ({} failed)",
        outcome.processed.len(),
        files.len(),
        outcome.failures.len()
    );
    outcome
}

/// Order by subject, item, then time after onset
pub fn sort_actions(actions: &mut [ActionRecord]) {
    actions.sort_by(|a, b| {
        a.subject
            .cmp(&b.subject)
            .then_with(|| a.item.cmp(&b.item))
            .then_with(|| a.elapsed_secs.total_cmp(&b.elapsed_secs))
    });
}

pub fn sort_aggregates(aggregates: &mut [AggregateRecord]) {
    aggregates.sort_by(|a, b| {
        a.subject
            .cmp(&b.subject)
            .then_with(|| a.item.cmp(&b.item))
            .then_with(|| a.phase.cmp(&b.phase))
    });
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Minimal trace log with one input and one output
    pub(crate) fn log_xml(user: &str, item: &str) -> String {
        format!(
            r#"<log>
  <tracesOverview>
    <logEntry>
      <logEntry user="{user}" entryPoint="{item}" test="MD2024">
        <designMicrodynModel>
          <variable userDefinedId="ExoA" id="v1" addend="0"/>
          <variable userDefinedId="EndoX" id="v2" addend="0" targetValue="0" targetLimit="1"/>
          <dependency sourceId="v1" targetId="v2" factor="2"/>
        </designMicrodynModel>
      </logEntry>
    </logEntry>
    <logEntry/>
    <logEntry timeStamp="2024-03-01T10:00:00.000"/>
    <logEntry>
      <logEntry><runtimeMicrodynModel/></logEntry>
    </logEntry>
  </tracesOverview>
  <microdynOverview explorationTime="120" controlTime="60"/>
</log>"#
        )
    }
}
