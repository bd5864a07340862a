//! Input/output role assignment for model variables

use serde::{Deserialize, Serialize};

/// Role a variable plays in the causal model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableRole {
    /// Exogenous variable set by the subject
    Input,
    /// Endogenous variable driven by the model
    Output,
}

/// Decides the role of a variable from its user-facing identifier
pub trait VariableRoles {
    /// Role of `name`, or `None` if the variable is neither input nor output
    fn role_of(&self, name: &str) -> Option<VariableRole>;
}

/// Substring naming convention (`ExoA` is an input, `EndoB` an output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableNaming {
    #[serde(default = "default_input_marker")]
    pub input_marker: String,
    #[serde(default = "default_output_marker")]
    pub output_marker: String,
}

fn default_input_marker() -> String {
    "Exo".to_string()
}

fn default_output_marker() -> String {
    "Endo".to_string()
}

impl Default for VariableNaming {
    fn default() -> Self {
        Self {
            input_marker: default_input_marker(),
            output_marker: default_output_marker(),
        }
    }
}

impl VariableNaming {
    pub fn new(input_marker: impl Into<String>, output_marker: impl Into<String>) -> Self {
        Self {
            input_marker: input_marker.into(),
            output_marker: output_marker.into(),
        }
    }
}

impl VariableRoles for VariableNaming {
    fn role_of(&self, name: &str) -> Option<VariableRole> {
        if !self.input_marker.is_empty() && name.contains(&self.input_marker) {
            Some(VariableRole::Input)
        } else if !self.output_marker.is_empty() && name.contains(&self.output_marker) {
            Some(VariableRole::Output)
        } else {
            None
        }
    }
}
