//! Parser configuration types
//!
//! This module defines the knobs of the decoding pipeline: which log entry
//! types map to which actions, which buttons are ignored, how variables are
//! assigned roles and how undecidable control scores are folded. Defaults
//! match the MicroDyn assessment logs.

use crate::model::VariableNaming;
use crate::scoring::IndeterminatePolicy;
use crate::types::ActionKind;
use serde::{Deserialize, Serialize};

/// Configuration for the log parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Button identifier that confirms an apply action and advances a round
    #[serde(default = "default_confirm_button")]
    pub confirm_button: String,

    /// Button/element identifiers that never produce action records
    #[serde(default = "default_ignored_buttons")]
    pub ignored_buttons: Vec<String>,

    /// Entry type discriminators for each action kind
    #[serde(default)]
    pub action_types: ActionTypeTable,

    /// Entry type discriminator of timestamp carriers
    #[serde(default = "default_timestamp_type")]
    pub timestamp_type: String,

    /// Index of the top-level entry holding the start timestamp
    #[serde(default = "default_start_entry_index")]
    pub start_entry_index: usize,

    /// Naming convention for input/output variables
    #[serde(default)]
    pub naming: VariableNaming,

    /// How undecidable per-variable control scores fold into the overall score
    #[serde(default)]
    pub indeterminate_policy: IndeterminatePolicy,

    /// Upper bound on visited entries per file
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_confirm_button() -> String {
    "Execute".to_string()
}

fn default_ignored_buttons() -> Vec<String> {
    [
        "Start",
        "End",
        "Reset",
        "$284335466347500", // start button Handball
        "$335515708423800", // start button Gardening
        "$284335424819300", // end item Handball
        "$335515641725400", // end item Gardening
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_timestamp_type() -> String {
    "cbaloggingmodel:LogEntryTimeStamp".to_string()
}

fn default_start_entry_index() -> usize {
    2
}

fn default_max_entries() -> usize {
    1_000_000
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            confirm_button: default_confirm_button(),
            ignored_buttons: default_ignored_buttons(),
            action_types: ActionTypeTable::default(),
            timestamp_type: default_timestamp_type(),
            start_entry_index: default_start_entry_index(),
            naming: VariableNaming::default(),
            indeterminate_policy: IndeterminatePolicy::default(),
            max_entries: default_max_entries(),
        }
    }
}

/// Entry type discriminators of the four logged action kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTypeTable {
    pub apply: String,
    pub add_dependency: String,
    pub remove_dependency: String,
    pub button: String,
}

impl Default for ActionTypeTable {
    fn default() -> Self {
        Self {
            apply: "cbaloggingmodel:MicroDynButtonPressLogEntry".to_string(),
            add_dependency: "cbaloggingmodel:MicroDynAddDependencyLogEntry".to_string(),
            remove_dependency: "cbaloggingmodel:MicroDynRemoveDependencyLogEntry".to_string(),
            button: "cbaloggingmodel:ButtonLogEntry".to_string(),
        }
    }
}

impl ActionTypeTable {
    fn entries(&self) -> [(ActionKind, &str); 4] {
        [
            (ActionKind::PressApply, self.apply.as_str()),
            (ActionKind::AddDependency, self.add_dependency.as_str()),
            (ActionKind::RemoveDependency, self.remove_dependency.as_str()),
            (ActionKind::PressButton, self.button.as_str()),
        ]
    }

    /// Action kind whose discriminator equals one of the entry's attribute values
    pub fn kind_of(&self, values: &[&str]) -> Option<ActionKind> {
        self.entries()
            .into_iter()
            .find(|(_, discriminator)| values.contains(discriminator))
            .map(|(kind, _)| kind)
    }
}

impl ParserConfig {
    /// Create a new parser configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the confirm button identifier
    pub fn with_confirm_button(mut self, button: impl Into<String>) -> Self {
        self.confirm_button = button.into();
        self
    }

    /// Builder method: add an identifier to the ignore-list
    pub fn add_ignored_button(mut self, button: impl Into<String>) -> Self {
        self.ignored_buttons.push(button.into());
        self
    }

    /// Builder method: set the start entry index
    pub fn with_start_entry_index(mut self, index: usize) -> Self {
        self.start_entry_index = index;
        self
    }

    /// Builder method: set the variable naming convention
    pub fn with_naming(mut self, naming: VariableNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Builder method: set the indeterminate fold policy
    pub fn with_indeterminate_policy(mut self, policy: IndeterminatePolicy) -> Self {
        self.indeterminate_policy = policy;
        self
    }

    /// Builder method: set the per-file entry limit
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Check if an identifier is on the ignore-list
    pub fn is_ignored(&self, identifier: &str) -> bool {
        self.ignored_buttons.iter().any(|b| b == identifier)
    }
}
