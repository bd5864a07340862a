//! Output generation
//!
//! Writes the action stream, the long and wide aggregate tables (CSV) and the
//! JSON batch report.

use crate::batch::BatchReport;
use anyhow::{Context, Result};
use microdyn_log_decoder::{ActionRecord, AggregateRecord, Timestamp};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Output file paths for one test
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub actions: PathBuf,
    pub long: PathBuf,
    pub wide: PathBuf,
    pub batch_report: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            actions: dir.join(format!("{}_actions.csv", prefix)),
            long: dir.join(format!("{}_aggregated_long.csv", prefix)),
            wide: dir.join(format!("{}_aggregated_wide.csv", prefix)),
            batch_report: dir.join(format!("{}_batch_report.json", prefix)),
        }
    }
}

fn format_date(ts: &Timestamp) -> String {
    ts.format(DATE_FORMAT).to_string()
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

#[derive(Debug, Serialize)]
struct ActionRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Item")]
    item: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Test")]
    test: &'a str,
    #[serde(rename = "TimeAfterOnset")]
    time_after_onset: f64,
    #[serde(rename = "Phase")]
    phase: Option<&'static str>,
    #[serde(rename = "Round")]
    round: Option<u32>,
    #[serde(rename = "Action")]
    action: &'static str,
    #[serde(rename = "SpecificAction")]
    specific_action: String,
}

impl<'a> From<&'a ActionRecord> for ActionRow<'a> {
    fn from(record: &'a ActionRecord) -> Self {
        // Dependency edits name the edge, everything else the control
        let specific_action = match &record.dependency {
            Some(edge) => edge.to_string(),
            None => record.label.clone(),
        };
        Self {
            id: &record.subject,
            item: &record.item,
            date: format_date(&record.timestamp),
            test: &record.test,
            time_after_onset: record.elapsed_secs,
            phase: record.phase.map(|p| p.as_str()),
            round: record.round,
            action: record.kind.as_str(),
            specific_action,
        }
    }
}

#[derive(Debug, Serialize)]
struct AggregateRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Item")]
    item: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Test")]
    test: &'a str,
    #[serde(rename = "Phase")]
    phase: &'static str,
    #[serde(rename = "Rounds")]
    rounds: u32,
    #[serde(rename = "ED")]
    eigendynamic: u8,
    #[serde(rename = "NumDependencies")]
    num_dependencies: usize,
    #[serde(rename = "NumInput")]
    num_inputs: usize,
    #[serde(rename = "NumOutput")]
    num_outputs: usize,
    #[serde(rename = "Time_NoInstr")]
    phase_duration: f64,
    #[serde(rename = "Correct")]
    correct: Option<u8>,
    #[serde(rename = "VOTATfreq")]
    votat_freq: usize,
    #[serde(rename = "HOTATfreq")]
    hotat_freq: usize,
    #[serde(rename = "NOTATfreq")]
    notat_freq: usize,
    #[serde(rename = "CAfreq")]
    ca_freq: usize,
    #[serde(rename = "VOTAT_x_vars")]
    votat_x_vars: usize,
    #[serde(rename = "fullVOTAT")]
    full_votat: u8,
    #[serde(rename = "StratSeq")]
    strategy_sequence: &'a str,
    #[serde(rename = "ActionSeq")]
    action_sequence: &'a str,
}

impl<'a> From<&'a AggregateRecord> for AggregateRow<'a> {
    fn from(record: &'a AggregateRecord) -> Self {
        Self {
            id: &record.subject,
            item: &record.item,
            date: format_date(&record.date),
            test: &record.test,
            phase: record.phase.as_str(),
            rounds: record.rounds,
            eigendynamic: flag(record.eigendynamic),
            num_dependencies: record.num_dependencies,
            num_inputs: record.num_inputs,
            num_outputs: record.num_outputs,
            phase_duration: record.phase_duration,
            correct: record.correct.score(),
            votat_freq: record.votat_freq,
            hotat_freq: record.hotat_freq,
            notat_freq: record.notat_freq,
            ca_freq: record.ca_freq,
            votat_x_vars: record.votat_x_vars,
            full_votat: flag(record.full_votat),
            strategy_sequence: &record.strategy_sequence,
            action_sequence: &record.action_sequence,
        }
    }
}

/// Numeric aggregate fields spread into the wide table
const WIDE_FIELDS: [&str; 13] = [
    "Rounds",
    "ED",
    "NumDependencies",
    "NumInput",
    "NumOutput",
    "Time_NoInstr",
    "Correct",
    "VOTATfreq",
    "HOTATfreq",
    "NOTATfreq",
    "CAfreq",
    "VOTAT_x_vars",
    "fullVOTAT",
];

fn wide_values(record: &AggregateRecord) -> [String; 13] {
    [
        record.rounds.to_string(),
        flag(record.eigendynamic).to_string(),
        record.num_dependencies.to_string(),
        record.num_inputs.to_string(),
        record.num_outputs.to_string(),
        record.phase_duration.to_string(),
        record.correct.score().map(|s| s.to_string()).unwrap_or_default(),
        record.votat_freq.to_string(),
        record.hotat_freq.to_string(),
        record.notat_freq.to_string(),
        record.ca_freq.to_string(),
        record.votat_x_vars.to_string(),
        flag(record.full_votat).to_string(),
    ]
}

fn create_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    Ok(csv::Writer::from_writer(BufWriter::new(file)))
}

/// One row per action record
pub fn write_actions(path: &Path, actions: &[ActionRecord]) -> Result<()> {
    let mut writer = create_writer(path)?;
    for record in actions {
        writer.serialize(ActionRow::from(record))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    log::info!("Wrote {} action rows to {:?}", actions.len(), path);
    Ok(())
}

/// One row per (subject, item, phase)
pub fn write_long(path: &Path, aggregates: &[AggregateRecord]) -> Result<()> {
    let mut writer = create_writer(path)?;
    for record in aggregates {
        writer.serialize(AggregateRow::from(record))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    log::info!("Wrote {} aggregate rows to {:?}", aggregates.len(), path);
    Ok(())
}

/// One row per subject with columns `<item>_<field>_<phase>`
pub fn write_wide(path: &Path, aggregates: &[AggregateRecord]) -> Result<()> {
    let mut columns = BTreeSet::new();
    let mut rows: BTreeMap<&str, BTreeMap<String, String>> = BTreeMap::new();

    for record in aggregates {
        let row = rows.entry(record.subject.as_str()).or_default();
        for (field, value) in WIDE_FIELDS.iter().zip(wide_values(record)) {
            let column = format!("{}_{}_{}", record.item, field, record.phase);
            columns.insert(column.clone());
            row.insert(column, value);
        }
    }

    let mut writer = create_writer(path)?;
    let mut header = vec!["ID".to_string()];
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for (subject, values) in &rows {
        let mut record = vec![subject.to_string()];
        record.extend(
            columns
                .iter()
                .map(|c| values.get(c).cloned().unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    log::info!(
        "Wrote {} subjects x {} columns to {:?}",
        rows.len(),
        columns.len(),
        path
    );
    Ok(())
}

pub fn write_batch_report(path: &Path, report: &BatchReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
