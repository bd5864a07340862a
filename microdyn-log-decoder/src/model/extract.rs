//! Extraction of the causal model from the log tree
//!
//! Variables come from `<variable>` elements (`id`, `userDefinedId`, `addend`,
//! plus `targetValue`/`targetLimit` for outputs), dependencies from
//! `<dependency>` elements (`sourceId`, `targetId`, `factor`).

use crate::log_tree::{elements_named, number_attr, required_attr};
use crate::model::{CausalModel, Threshold, Variable, VariableRole, VariableRoles};
use crate::types::{Edge, Result};
use roxmltree::Node;
use std::collections::BTreeSet;

/// Dependencies with this factor are definitional and never scored
const STRUCTURAL_FACTOR: f64 = 1.0;

/// Read the design-time model subtree
pub fn extract_model(design: Node<'_, '_>, roles: &dyn VariableRoles) -> Result<CausalModel> {
    let mut variables = Vec::new();

    for node in elements_named(design, "variable") {
        let name = required_attr(node, "userDefinedId")?.to_string();
        let role = roles.role_of(&name);

        let threshold = if role == Some(VariableRole::Output) {
            Some(Threshold::new(
                number_attr(node, "targetValue")?,
                number_attr(node, "targetLimit")?,
            ))
        } else {
            None
        };

        variables.push(Variable {
            id: required_attr(node, "id")?.to_string(),
            name,
            addend: number_attr(node, "addend")?,
            role,
            threshold,
        });
    }

    let mut ground_truth = BTreeSet::new();
    for node in elements_named(design, "dependency") {
        let factor: f64 = number_attr(node, "factor")?;
        if factor == STRUCTURAL_FACTOR {
            continue;
        }
        ground_truth.insert(dependency_edge(node)?);
    }

    for variable in variables.iter().filter(|v| v.is_eigendynamic()) {
        ground_truth.insert(Edge::self_loop(variable.id.as_str()));
    }

    let model = CausalModel {
        variables,
        ground_truth,
    };

    log::debug!(
        "Extracted model: {} inputs, {} outputs, {} dependencies, eigendynamic={}",
        model.num_inputs(),
        model.num_outputs(),
        model.num_dependencies(),
        model.has_eigendynamic()
    );

    Ok(model)
}

/// Dependencies drawn by the subject, read from the runtime model subtree
pub fn runtime_edges(runtime: Node<'_, '_>) -> Result<BTreeSet<Edge>> {
    elements_named(runtime, "dependency")
        .map(dependency_edge)
        .collect()
}

fn dependency_edge(node: Node<'_, '_>) -> Result<Edge> {
    Ok(Edge::new(
        required_attr(node, "sourceId")?,
        required_attr(node, "targetId")?,
    ))
}
