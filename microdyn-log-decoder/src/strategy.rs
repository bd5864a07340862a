//! Exploration strategy classification
//!
//! An apply action is classified from the input values committed with it. A
//! zero input was left untouched in that round, so the number of zeros `z`
//! among `n` inputs determines the strategy:
//!
//! | condition          | strategy |
//! |--------------------|----------|
//! | `z == n`           | NOTAT    |
//! | `z == n - 1`       | VOTAT    |
//! | `z == 0`           | CA       |
//! | `n > 2 && z == 1`  | HOTAT    |
//! | otherwise          | none     |
//!
//! Conditions are checked top to bottom.

use crate::types::{Strategy, VariableSnapshot};

/// Classify from the number of inputs and the number of zero inputs
pub fn classify_counts(num_inputs: usize, num_zeros: usize) -> Option<Strategy> {
    let n = num_inputs;
    let z = num_zeros;

    if z == n {
        Some(Strategy::Notat)
    } else if n >= 1 && z == n - 1 {
        Some(Strategy::Votat)
    } else if z == 0 {
        Some(Strategy::Ca)
    } else if n > 2 && z == 1 {
        Some(Strategy::Hotat)
    } else {
        None
    }
}

/// Classify a complete vector of input values
pub fn classify(values: &[i64]) -> Option<Strategy> {
    let zeros = values.iter().filter(|&&v| v == 0).count();
    classify_counts(values.len(), zeros)
}

/// Input values from a snapshot, in the order of `inputs`
///
/// Returns `None` when any input is missing from the snapshot.
pub fn input_values(snapshot: &VariableSnapshot, inputs: &[&str]) -> Option<Vec<i64>> {
    inputs
        .iter()
        .map(|name| snapshot.get(*name).copied())
        .collect()
}

/// Tracks which inputs were varied in isolation (VOTAT) during exploration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotatCoverage {
    /// Summed absolute value per input column
    column_sums: Vec<i64>,
    snapshots: usize,
}

impl VotatCoverage {
    pub fn new(num_inputs: usize) -> Self {
        Self {
            column_sums: vec![0; num_inputs],
            snapshots: 0,
        }
    }

    /// Add the input values of one VOTAT apply action
    pub fn record(&mut self, values: &[i64]) {
        for (sum, value) in self.column_sums.iter_mut().zip(values) {
            *sum = sum.saturating_add(value.saturating_abs());
        }
        self.snapshots += 1;
    }

    /// Number of VOTAT snapshots recorded
    pub fn snapshots(&self) -> usize {
        self.snapshots
    }

    /// Number of inputs varied at least once
    pub fn covered(&self) -> usize {
        self.column_sums.iter().filter(|&&sum| sum != 0).count()
    }

    /// Every input was varied in isolation at least once
    pub fn is_full(&self) -> bool {
        !self.column_sums.is_empty() && self.covered() == self.column_sums.len()
    }
}
