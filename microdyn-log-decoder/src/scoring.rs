//! Correctness scoring for both task phases
//!
//! - Exploration: the subject's final dependency graph must equal the ground
//!   truth as a set of edges.
//! - Control: the last committed value of each output must lie inside its
//!   threshold interval. Each output gets a three-valued [`Outcome`]; the
//!   [`IndeterminatePolicy`] decides how outputs without any committed value
//!   fold into the overall score.

use crate::model::{CausalModel, Threshold};
use crate::types::{ActionRecord, Edge, Outcome, Phase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fold rule for outputs whose outcome is indeterminate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndeterminatePolicy {
    /// Indeterminate counts as incorrect
    #[default]
    Fail,
    /// Indeterminate wins over correct, incorrect wins over both
    Propagate,
    /// Indeterminate outputs are left out of the fold
    Ignore,
}

/// Control score of a single output variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableScore {
    pub name: String,
    /// Last committed value, if any
    pub value: Option<i64>,
    pub threshold: Threshold,
    pub outcome: Outcome,
}

/// Control score of all outputs of one item
#[derive(Debug, Clone, PartialEq)]
pub struct ControlScore {
    pub variables: Vec<VariableScore>,
    pub overall: Outcome,
}

/// Correctness of both phases for one (subject, item)
#[derive(Debug, Clone, PartialEq)]
pub struct Correctness {
    pub exploration: Outcome,
    pub control: ControlScore,
}

impl Correctness {
    pub fn for_phase(&self, phase: Phase) -> Outcome {
        match phase {
            Phase::Exploration => self.exploration,
            Phase::Control => self.control.overall,
        }
    }
}

/// Compare ground-truth edges with the subject's edges (order and duplicates ignored)
pub fn score_exploration<'e>(
    ground_truth: impl IntoIterator<Item = &'e Edge>,
    response: impl IntoIterator<Item = &'e Edge>,
) -> Outcome {
    let expected: BTreeSet<&Edge> = ground_truth.into_iter().collect();
    let given: BTreeSet<&Edge> = response.into_iter().collect();
    Outcome::from_bool(expected == given)
}

/// Last value of `variable` across the records, in record order
pub fn last_value(records: &[ActionRecord], variable: &str) -> Option<i64> {
    records
        .iter()
        .rev()
        .filter_map(|r| r.snapshot.as_ref())
        .find_map(|snapshot| snapshot.get(variable).copied())
}

/// Score every output against its threshold and fold with `policy`
pub fn score_control(
    model: &CausalModel,
    records: &[ActionRecord],
    policy: IndeterminatePolicy,
) -> ControlScore {
    let variables: Vec<VariableScore> = model
        .thresholds()
        .map(|(name, threshold)| {
            let value = last_value(records, name);
            let outcome = match value {
                Some(v) => Outcome::from_bool(threshold.contains(v as f64)),
                None => {
                    log::warn!("No committed value for output '{}', score is indeterminate", name);
                    Outcome::Indeterminate
                }
            };
            log::debug!(
                "Control {}: given={:?} target=[{}, {}] -> {:?}",
                name,
                value,
                threshold.lower(),
                threshold.upper(),
                outcome
            );
            VariableScore {
                name: name.to_string(),
                value,
                threshold,
                outcome,
            }
        })
        .collect();

    let overall = fold_outcomes(variables.iter().map(|v| v.outcome), policy);
    ControlScore { variables, overall }
}

/// Fold per-variable outcomes into one
pub fn fold_outcomes(
    outcomes: impl IntoIterator<Item = Outcome>,
    policy: IndeterminatePolicy,
) -> Outcome {
    let mut any_incorrect = false;
    let mut any_indeterminate = false;
    let mut any_correct = false;

    for outcome in outcomes {
        match outcome {
            Outcome::Correct => any_correct = true,
            Outcome::Incorrect => any_incorrect = true,
            Outcome::Indeterminate => any_indeterminate = true,
        }
    }

    if any_incorrect {
        return Outcome::Incorrect;
    }

    match policy {
        IndeterminatePolicy::Fail if any_indeterminate => Outcome::Incorrect,
        IndeterminatePolicy::Propagate if any_indeterminate => Outcome::Indeterminate,
        IndeterminatePolicy::Ignore if any_indeterminate && !any_correct => Outcome::Indeterminate,
        _ => Outcome::Correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Variable, VariableRole};
    use crate::types::{ActionKind, VariableSnapshot};
    use chrono::NaiveDate;

    fn record(snapshot: Option<&[(&str, i64)]>) -> ActionRecord {
        ActionRecord {
            subject: "S01".to_string(),
            item: "Handball".to_string(),
            test: "CPS".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2017, 6, 21)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            elapsed_secs: 0.0,
            phase: Some(Phase::Control),
            round: Some(1),
            kind: ActionKind::PressApply,
            label: "Execute".to_string(),
            dependency: None,
            snapshot: snapshot.map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect::<VariableSnapshot>()
            }),
            strategy: None,
        }
    }

    fn output(name: &str, target_value: f64, target_limit: f64) -> Variable {
        Variable {
            id: name.to_lowercase(),
            name: name.to_string(),
            addend: 0.0,
            role: Some(VariableRole::Output),
            threshold: Some(Threshold::new(target_value, target_limit)),
        }
    }

    #[test]
    fn test_exploration_set_semantics() {
        let truth = vec![Edge::new("a", "b"), Edge::new("b", "c")];
        let permuted = vec![Edge::new("b", "c"), Edge::new("a", "b"), Edge::new("a", "b")];
        assert_eq!(score_exploration(&truth, &permuted), Outcome::Correct);

        let missing = vec![Edge::new("a", "b")];
        assert_eq!(score_exploration(&truth, &missing), Outcome::Incorrect);

        let extra = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::self_loop("c")];
        assert_eq!(score_exploration(&truth, &extra), Outcome::Incorrect);
    }

    #[test]
    fn test_last_value_skips_records_without_variable() {
        let records = vec![
            record(Some(&[("EndoA", 2), ("EndoB", 9)])),
            record(Some(&[("EndoA", 5)])),
            record(None),
        ];
        assert_eq!(last_value(&records, "EndoA"), Some(5));
        assert_eq!(last_value(&records, "EndoB"), Some(9));
        assert_eq!(last_value(&records, "EndoC"), None);
    }

    #[test]
    fn test_control_reversed_bounds() {
        let model = CausalModel {
            variables: vec![output("EndoA", 7.0, 3.0)],
            ground_truth: BTreeSet::new(),
        };
        let records = vec![record(Some(&[("EndoA", 6)]))];
        let score = score_control(&model, &records, IndeterminatePolicy::Fail);
        assert_eq!(score.overall, Outcome::Correct);
        assert_eq!(score.variables[0].value, Some(6));
    }

    #[test]
    fn test_control_one_output_outside() {
        let model = CausalModel {
            variables: vec![output("EndoA", 3.0, 7.0), output("EndoB", 10.0, 12.0)],
            ground_truth: BTreeSet::new(),
        };
        let records = vec![record(Some(&[("EndoA", 4), ("EndoB", 13)]))];
        let score = score_control(&model, &records, IndeterminatePolicy::Ignore);
        assert_eq!(score.variables[0].outcome, Outcome::Correct);
        assert_eq!(score.variables[1].outcome, Outcome::Incorrect);
        assert_eq!(score.overall, Outcome::Incorrect);
    }

    #[test]
    fn test_control_missing_value_per_policy() {
        let model = CausalModel {
            variables: vec![output("EndoA", 3.0, 7.0), output("EndoB", 10.0, 12.0)],
            ground_truth: BTreeSet::new(),
        };
        let records = vec![record(Some(&[("EndoA", 4)]))];

        let fail = score_control(&model, &records, IndeterminatePolicy::Fail);
        assert_eq!(fail.variables[1].outcome, Outcome::Indeterminate);
        assert_eq!(fail.overall, Outcome::Incorrect);

        let propagate = score_control(&model, &records, IndeterminatePolicy::Propagate);
        assert_eq!(propagate.overall, Outcome::Indeterminate);

        let ignore = score_control(&model, &records, IndeterminatePolicy::Ignore);
        assert_eq!(ignore.overall, Outcome::Correct);
    }

    #[test]
    fn test_fold_all_indeterminate() {
        let all = [Outcome::Indeterminate, Outcome::Indeterminate];
        assert_eq!(fold_outcomes(all, IndeterminatePolicy::Ignore), Outcome::Indeterminate);
        assert_eq!(fold_outcomes(all, IndeterminatePolicy::Fail), Outcome::Incorrect);
        assert_eq!(fold_outcomes(std::iter::empty(), IndeterminatePolicy::Fail), Outcome::Correct);
    }
}
