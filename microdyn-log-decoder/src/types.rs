//! Core types for the MicroDyn log decoder library
//!
//! This module defines the records the decoder emits when processing a trace
//! log: one [`ActionRecord`] per recognized interaction and one
//! [`AggregateRecord`] per (subject, item, phase).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Timestamp type used throughout the decoder (local wall-clock time of the log)
pub type Timestamp = NaiveDateTime;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, ParserError>;

/// Variable values captured at an apply action (userDefinedId → value)
pub type VariableSnapshot = BTreeMap<String, i64>;

/// Errors that can occur while decoding one log file
///
/// Every variant is fatal for the file being processed, never for a batch.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Malformed log: {0}")]
    MalformedLog(String),

    #[error("Invalid value for attribute '{attribute}': {value:?}")]
    ValueFormat { attribute: String, value: String },

    #[error("Failed to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ParserError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ParserError::MalformedLog(message.into())
    }

    pub(crate) fn value_format(attribute: &str, value: &str) -> Self {
        ParserError::ValueFormat {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

/// Task stage an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Free experimentation with the inputs
    Exploration,
    /// Goal-directed steering of the outputs
    Control,
}

impl Phase {
    /// All phases in task order
    pub const ALL: [Phase; 2] = [Phase::Exploration, Phase::Control];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Exploration => "exploration",
            Phase::Control => "control",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exploration" => Ok(Phase::Exploration),
            "control" => Ok(Phase::Control),
            other => Err(ParserError::malformed(format!("Unknown phase: {:?}", other))),
        }
    }
}

/// Kind of a recorded interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Apply/Execute button press
    PressApply,
    AddDependency,
    RemoveDependency,
    /// Any other button
    PressButton,
    /// Synthetic record at the file's start timestamp
    Start,
    /// Synthetic record at the end of the exploration phase
    EndExploration,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::PressApply => "PressApply",
            ActionKind::AddDependency => "AddDependency",
            ActionKind::RemoveDependency => "RemoveDependency",
            ActionKind::PressButton => "PressButton",
            ActionKind::Start => "Start",
            ActionKind::EndExploration => "EndExploration",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exploration strategy of a single apply action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Strategy {
    /// No input changed
    Notat,
    /// Exactly one input changed
    Votat,
    /// All inputs but one changed
    Hotat,
    /// All inputs changed
    Ca,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [Strategy::Votat, Strategy::Hotat, Strategy::Notat, Strategy::Ca];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Notat => "NOTAT",
            Strategy::Votat => "VOTAT",
            Strategy::Hotat => "HOTAT",
            Strategy::Ca => "CA",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed dependency between two model variables
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Self-influence edge (x → x)
    pub fn self_loop(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            source: id.clone(),
            target: id,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Three-valued scoring outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    /// Not enough data to decide
    Indeterminate,
}

impl Outcome {
    pub fn from_bool(correct: bool) -> Self {
        if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }

    /// 1/0 score, `None` when indeterminate
    pub fn score(&self) -> Option<u8> {
        match self {
            Outcome::Correct => Some(1),
            Outcome::Incorrect => Some(0),
            Outcome::Indeterminate => None,
        }
    }
}

/// Identifying attributes of one subject-item log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProperties {
    /// Subject identifier (`user`)
    pub subject: String,
    /// Item identifier (`entryPoint`)
    pub item: String,
    /// Test identifier (`test`)
    pub test: String,
}

/// One recognized interaction from the log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub subject: String,
    pub item: String,
    pub test: String,
    /// Wall-clock time of the most recent timestamp entry
    pub timestamp: Timestamp,
    /// Seconds since the file's start timestamp
    pub elapsed_secs: f64,
    pub phase: Option<Phase>,
    /// Round within `phase`; absent when the entry carries no phase
    pub round: Option<u32>,
    pub kind: ActionKind,
    /// Button or element identifier (`START`/`END` for synthetic records)
    pub label: String,
    /// Edge added or removed during exploration
    pub dependency: Option<Edge>,
    /// Variable values at a confirmed apply action
    pub snapshot: Option<VariableSnapshot>,
    pub strategy: Option<Strategy>,
}

/// Summary of one (subject, item, phase)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    pub subject: String,
    pub item: String,
    /// Start timestamp of the log
    pub date: Timestamp,
    pub test: String,
    pub phase: Phase,
    /// Highest round number seen in the phase
    pub rounds: u32,
    /// Item has at least one eigendynamic variable
    pub eigendynamic: bool,
    pub num_dependencies: usize,
    pub num_inputs: usize,
    pub num_outputs: usize,
    /// Phase time excluding instruction, from the task overview
    pub phase_duration: f64,
    pub correct: Outcome,
    pub votat_freq: usize,
    pub hotat_freq: usize,
    pub notat_freq: usize,
    pub ca_freq: usize,
    /// Number of inputs varied in isolation during exploration
    pub votat_x_vars: usize,
    pub full_votat: bool,
    pub strategy_sequence: String,
    pub action_sequence: String,
}

impl AggregateRecord {
    pub fn strategy_freq(&self, strategy: Strategy) -> usize {
        match strategy {
            Strategy::Votat => self.votat_freq,
            Strategy::Hotat => self.hotat_freq,
            Strategy::Notat => self.notat_freq,
            Strategy::Ca => self.ca_freq,
        }
    }
}
