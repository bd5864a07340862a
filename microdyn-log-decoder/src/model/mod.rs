//! Causal model of a MicroDyn item
//!
//! This module holds the design-time model (variables, roles, eigendynamics,
//! ground-truth dependencies, control thresholds) and its extraction from the
//! log tree.

pub mod extract;
pub mod roles;

pub use extract::{extract_model, runtime_edges};
pub use roles::{VariableNaming, VariableRole, VariableRoles};

use crate::types::Edge;
use std::collections::BTreeSet;

/// A variable definition from the design-time model
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Internal identifier used by dependency edges
    pub id: String,
    /// User-facing identifier used in value snapshots (e.g. `ExoA`)
    pub name: String,
    /// Self-influence term; non-zero means eigendynamic
    pub addend: f64,
    pub role: Option<VariableRole>,
    /// Control target, present for outputs only
    pub threshold: Option<Threshold>,
}

impl Variable {
    pub fn is_eigendynamic(&self) -> bool {
        self.addend != 0.0
    }
}

/// Closed acceptance interval between a target value and a target limit
///
/// The two bounds may come in either order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub target_value: f64,
    pub target_limit: f64,
}

impl Threshold {
    pub fn new(target_value: f64, target_limit: f64) -> Self {
        Self {
            target_value,
            target_limit,
        }
    }

    pub fn lower(&self) -> f64 {
        self.target_value.min(self.target_limit)
    }

    pub fn upper(&self) -> f64 {
        self.target_value.max(self.target_limit)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower() <= value && value <= self.upper()
    }
}

/// Design-time causal model of one item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CausalModel {
    /// All variables in document order
    pub variables: Vec<Variable>,
    /// Scored dependencies, including eigendynamic self-edges
    pub ground_truth: BTreeSet<Edge>,
}

impl CausalModel {
    /// User-facing names of the input variables, in document order
    pub fn inputs(&self) -> Vec<&str> {
        self.names_with_role(VariableRole::Input)
    }

    /// User-facing names of the output variables, in document order
    pub fn outputs(&self) -> Vec<&str> {
        self.names_with_role(VariableRole::Output)
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs().len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs().len()
    }

    /// Variables with a non-zero addend
    pub fn eigendynamic(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.is_eigendynamic())
    }

    pub fn has_eigendynamic(&self) -> bool {
        self.eigendynamic().next().is_some()
    }

    pub fn num_dependencies(&self) -> usize {
        self.ground_truth.len()
    }

    /// Output variables paired with their control thresholds
    pub fn thresholds(&self) -> impl Iterator<Item = (&str, Threshold)> {
        self.variables
            .iter()
            .filter(|v| v.role == Some(VariableRole::Output))
            .filter_map(|v| v.threshold.map(|t| (v.name.as_str(), t)))
    }

    fn names_with_role(&self, role: VariableRole) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| v.role == Some(role))
            .map(|v| v.name.as_str())
            .collect()
    }
}
