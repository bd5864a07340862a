//! Event walker: one depth-first pass over the trace log
//!
//! The walker visits every top-level entry and all of its descendants in
//! document order. Timestamp entries advance the clock; entries whose type
//! matches an action kind produce one [`ActionRecord`] each. All running state
//! (clock, per-phase round counters, VOTAT coverage) lives in a
//! [`TraversalContext`] owned by a single [`EventWalker::walk`] call.

use crate::config::ParserConfig;
use crate::log_tree::{
    descendants, elements_named, number_attr, parse_timestamp, required_attr, LogTree,
    TaskOverview,
};
use crate::model::CausalModel;
use crate::strategy::{classify, input_values, VotatCoverage};
use crate::types::{
    ActionKind, ActionRecord, Edge, ParserError, Phase, Result, Strategy, TaskProperties,
    Timestamp, VariableSnapshot,
};
use roxmltree::Node;

/// Round counter per phase, starting at 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundCounters {
    exploration: u32,
    control: u32,
}

impl RoundCounters {
    pub fn get(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Exploration => self.exploration,
            Phase::Control => self.control,
        }
    }

    /// Increment the counter of `phase` and return the new round
    fn advance(&mut self, phase: Phase) -> u32 {
        let counter = match phase {
            Phase::Exploration => &mut self.exploration,
            Phase::Control => &mut self.control,
        };
        *counter += 1;
        *counter
    }
}

/// Running state of one traversal
#[derive(Debug)]
struct TraversalContext {
    rounds: RoundCounters,
    current_time: Timestamp,
    elapsed_secs: f64,
    visited: usize,
    votat: VotatCoverage,
}

impl TraversalContext {
    fn new(start_time: Timestamp, num_inputs: usize) -> Self {
        Self {
            rounds: RoundCounters::default(),
            current_time: start_time,
            elapsed_secs: 0.0,
            visited: 0,
            votat: VotatCoverage::new(num_inputs),
        }
    }

    fn set_time(&mut self, time: Timestamp, start_time: Timestamp) {
        self.current_time = time;
        self.elapsed_secs = seconds_between(start_time, time);
    }
}

/// Result of walking one log
#[derive(Debug, Clone)]
pub struct WalkOutput {
    /// Action records in traversal order, framed by the start and end records
    pub records: Vec<ActionRecord>,
    /// Inputs varied in isolation during exploration
    pub votat: VotatCoverage,
    /// Final round counters
    pub rounds: RoundCounters,
}

/// Walks one trace log and emits action records
pub struct EventWalker<'w> {
    config: &'w ParserConfig,
    properties: &'w TaskProperties,
    inputs: Vec<&'w str>,
    start_time: Timestamp,
}

impl<'w> EventWalker<'w> {
    pub fn new(
        config: &'w ParserConfig,
        properties: &'w TaskProperties,
        model: &'w CausalModel,
        start_time: Timestamp,
    ) -> Self {
        Self {
            config,
            properties,
            inputs: model.inputs(),
            start_time,
        }
    }

    /// Walk all entries of `tree`
    pub fn walk(&self, tree: &LogTree<'_, '_>, overview: &TaskOverview) -> Result<WalkOutput> {
        let mut ctx = TraversalContext::new(self.start_time, self.inputs.len());
        let mut records = vec![self.start_record()];

        for entry in tree.entries() {
            for node in descendants(entry) {
                ctx.visited += 1;
                if ctx.visited > self.config.max_entries {
                    return Err(ParserError::malformed(format!(
                        "Log exceeds the limit of {} entries",
                        self.config.max_entries
                    )));
                }

                if let Some(record) = self.visit(&mut ctx, node)? {
                    records.push(record);
                }
            }
        }

        records.push(self.end_record(overview.exploration_time)?);

        log::trace!("Walked {} entries: {} records", ctx.visited, records.len());

        Ok(WalkOutput {
            records,
            votat: ctx.votat,
            rounds: ctx.rounds,
        })
    }

    /// Process a single entry and generate an action record if it is one
    fn visit(&self, ctx: &mut TraversalContext, node: Node<'_, '_>) -> Result<Option<ActionRecord>> {
        let values: Vec<&str> = node.attributes().map(|a| a.value()).collect();

        if values.contains(&self.config.timestamp_type.as_str()) {
            let time = parse_timestamp(required_attr(node, "timeStamp")?)?;
            ctx.set_time(time, self.start_time);
            return Ok(None);
        }

        let kind = match self.config.action_types.kind_of(&values) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        let target = node
            .attribute("button")
            .or_else(|| node.attribute("id"))
            .unwrap_or_default();

        // Ignored entries are dropped before any other attribute is read
        if self.config.is_ignored(target) {
            log::trace!("Skipping ignored entry '{}'", target);
            return Ok(None);
        }

        let phase = node
            .attribute("phase")
            .map(str::parse::<Phase>)
            .transpose()?;

        let mut snapshot = None;
        let mut strategy = None;
        let mut dependency = None;

        match (kind, phase) {
            (ActionKind::PressApply, Some(phase)) if target == self.config.confirm_button => {
                let round = ctx.rounds.advance(phase);
                let values = capture_snapshot(node)?;
                strategy = self.classify_snapshot(ctx, phase, &values);
                log::debug!("{} round {}: {:?} -> {:?}", phase, round, values, strategy);
                snapshot = Some(values);
            }
            (ActionKind::AddDependency | ActionKind::RemoveDependency, Some(Phase::Exploration)) => {
                dependency = Some(Edge::new(
                    required_attr(node, "sourceId")?,
                    required_attr(node, "destinationId")?,
                ));
            }
            _ => {}
        }

        Ok(Some(ActionRecord {
            subject: self.properties.subject.clone(),
            item: self.properties.item.clone(),
            test: self.properties.test.clone(),
            timestamp: ctx.current_time,
            elapsed_secs: ctx.elapsed_secs,
            phase,
            round: phase.map(|p| ctx.rounds.get(p)),
            kind,
            label: target.to_string(),
            dependency,
            snapshot,
            strategy,
        }))
    }

    /// Strategy of a confirmed apply; VOTAT during exploration feeds the coverage
    fn classify_snapshot(
        &self,
        ctx: &mut TraversalContext,
        phase: Phase,
        snapshot: &VariableSnapshot,
    ) -> Option<Strategy> {
        let Some(values) = input_values(snapshot, &self.inputs) else {
            log::warn!(
                "Incomplete input snapshot for {} / {} in {} phase, strategy left empty",
                self.properties.subject,
                self.properties.item,
                phase
            );
            return None;
        };

        let strategy = classify(&values);
        if strategy == Some(Strategy::Votat) && phase == Phase::Exploration {
            ctx.votat.record(&values);
        }
        strategy
    }

    fn start_record(&self) -> ActionRecord {
        ActionRecord {
            subject: self.properties.subject.clone(),
            item: self.properties.item.clone(),
            test: self.properties.test.clone(),
            timestamp: self.start_time,
            elapsed_secs: 0.0,
            phase: None,
            round: Some(0),
            kind: ActionKind::Start,
            label: "START".to_string(),
            dependency: None,
            snapshot: None,
            strategy: None,
        }
    }

    /// The log has no entry for the end of exploration; it is placed at the
    /// exploration time reported by the task overview.
    fn end_record(&self, exploration_time: f64) -> Result<ActionRecord> {
        let out_of_range =
            || ParserError::value_format("explorationTime", &exploration_time.to_string());
        let millis = (exploration_time * 1000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(out_of_range());
        }
        let timestamp = chrono::Duration::try_milliseconds(millis as i64)
            .and_then(|offset| self.start_time.checked_add_signed(offset))
            .ok_or_else(out_of_range)?;

        Ok(ActionRecord {
            subject: self.properties.subject.clone(),
            item: self.properties.item.clone(),
            test: self.properties.test.clone(),
            timestamp,
            elapsed_secs: exploration_time,
            phase: Some(Phase::Exploration),
            round: None,
            kind: ActionKind::EndExploration,
            label: "END".to_string(),
            dependency: None,
            snapshot: None,
            strategy: None,
        })
    }
}

/// Values of every `<variable>` nested in an apply entry
fn capture_snapshot(node: Node<'_, '_>) -> Result<VariableSnapshot> {
    elements_named(node, "variable")
        .map(|variable| {
            Ok((
                required_attr(variable, "userDefinedId")?.to_string(),
                number_attr::<i64>(variable, "value")?,
            ))
        })
        .collect()
}

fn seconds_between(start: Timestamp, end: Timestamp) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}
