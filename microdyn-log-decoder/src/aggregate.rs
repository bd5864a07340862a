//! Per-phase aggregation of one file's action records

use crate::log_tree::TaskOverview;
use crate::model::CausalModel;
use crate::scoring::Correctness;
use crate::strategy::VotatCoverage;
use crate::types::{ActionRecord, AggregateRecord, Phase, Strategy, TaskProperties, Timestamp};

/// Separator of the strategy and action sequences
pub const SEQUENCE_SEPARATOR: &str = "-";

/// File-level inputs shared by all phase summaries of one (subject, item)
pub struct AggregateContext<'a> {
    pub properties: &'a TaskProperties,
    pub start_time: Timestamp,
    pub model: &'a CausalModel,
    pub overview: &'a TaskOverview,
    pub correctness: &'a Correctness,
    pub votat: &'a VotatCoverage,
}

/// One summary per phase that has at least one action record
pub fn aggregate(ctx: &AggregateContext<'_>, records: &[ActionRecord]) -> Vec<AggregateRecord> {
    Phase::ALL
        .iter()
        .filter_map(|&phase| {
            let in_phase: Vec<&ActionRecord> = records
                .iter()
                .filter(|r| r.phase == Some(phase))
                .collect();

            if in_phase.is_empty() {
                log::debug!(
                    "No records for {} / {} in {} phase",
                    ctx.properties.subject,
                    ctx.properties.item,
                    phase
                );
                return None;
            }

            Some(summarize(ctx, phase, &in_phase))
        })
        .collect()
}

fn summarize(ctx: &AggregateContext<'_>, phase: Phase, records: &[&ActionRecord]) -> AggregateRecord {
    let count = |strategy: Strategy| records.iter().filter(|r| r.strategy == Some(strategy)).count();

    let strategy_sequence = records
        .iter()
        .filter_map(|r| r.strategy.map(|s| s.as_str()))
        .collect::<Vec<_>>()
        .join(SEQUENCE_SEPARATOR);

    let action_sequence = records
        .iter()
        .map(|r| r.kind.as_str())
        .collect::<Vec<_>>()
        .join(SEQUENCE_SEPARATOR);

    AggregateRecord {
        subject: ctx.properties.subject.clone(),
        item: ctx.properties.item.clone(),
        date: ctx.start_time,
        test: ctx.properties.test.clone(),
        phase,
        rounds: records.iter().filter_map(|r| r.round).max().unwrap_or(0),
        eigendynamic: ctx.model.has_eigendynamic(),
        num_dependencies: ctx.model.num_dependencies(),
        num_inputs: ctx.model.num_inputs(),
        num_outputs: ctx.model.num_outputs(),
        phase_duration: ctx.overview.duration(phase),
        correct: ctx.correctness.for_phase(phase),
        votat_freq: count(Strategy::Votat),
        hotat_freq: count(Strategy::Hotat),
        notat_freq: count(Strategy::Notat),
        ca_freq: count(Strategy::Ca),
        votat_x_vars: ctx.votat.covered(),
        full_votat: ctx.votat.is_full(),
        strategy_sequence,
        action_sequence,
    }
}
