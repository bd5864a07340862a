//! Main parser API
//!
//! This module provides the primary interface for the decoder library. The
//! [`LogParser`] runs the full pipeline over one trace log and either returns
//! every derived record or fails as a whole.

use crate::aggregate::{aggregate, AggregateContext};
use crate::config::ParserConfig;
use crate::log_tree::LogTree;
use crate::model::{extract_model, runtime_edges, CausalModel};
use crate::scoring::{score_control, score_exploration, Correctness};
use crate::types::{ActionRecord, AggregateRecord, Phase, Result, TaskProperties, Timestamp};
use crate::walker::EventWalker;
use roxmltree::Document;
use std::path::Path;

/// Everything derived from one trace log
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub properties: TaskProperties,
    pub start_time: Timestamp,
    pub model: CausalModel,
    /// Action stream in traversal order
    pub actions: Vec<ActionRecord>,
    /// One summary per phase
    pub aggregates: Vec<AggregateRecord>,
    pub correctness: Correctness,
}

/// The main parser struct - entry point for decoding trace logs
#[derive(Debug, Clone, Default)]
pub struct LogParser {
    config: ParserConfig,
}

impl LogParser {
    /// Create a parser with the given configuration
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Decode a trace log file
    ///
    /// # Example
    /// ```no_run
    /// use microdyn_log_decoder::{LogParser, ParserConfig};
    /// use std::path::Path;
    ///
    /// let parser = LogParser::new(ParserConfig::default());
    /// let parsed = parser.parse_file(Path::new("data/S01_Handball_scoring.xml")).unwrap();
    /// for row in &parsed.aggregates {
    ///     println!("{} {}: {} rounds", row.item, row.phase, row.rounds);
    /// }
    /// ```
    pub fn parse_file(&self, path: &Path) -> Result<ParsedLog> {
        log::info!("Decoding log file: {:?}", path);
        let xml = std::fs::read_to_string(path)?;
        self.parse_str(&xml)
    }

    /// Decode a trace log held in memory
    pub fn parse_str(&self, xml: &str) -> Result<ParsedLog> {
        let doc = Document::parse(xml)?;
        let tree = LogTree::new(&doc)?;

        let properties = tree.properties()?;
        let start_time = tree.start_time(self.config.start_entry_index)?;
        let model = extract_model(tree.design_model()?, &self.config.naming)?;
        let response = runtime_edges(tree.runtime_model()?)?;
        let overview = tree.overview()?;

        let walked = EventWalker::new(&self.config, &properties, &model, start_time)
            .walk(&tree, &overview)?;

        log::debug!(
            "{} / {}: {} exploration and {} control rounds, {} VOTAT snapshots covering {} of {} inputs",
            properties.subject,
            properties.item,
            walked.rounds.get(Phase::Exploration),
            walked.rounds.get(Phase::Control),
            walked.votat.snapshots(),
            walked.votat.covered(),
            model.num_inputs()
        );

        let correctness = Correctness {
            exploration: score_exploration(&model.ground_truth, &response),
            control: score_control(&model, &walked.records, self.config.indeterminate_policy),
        };

        let aggregates = aggregate(
            &AggregateContext {
                properties: &properties,
                start_time,
                model: &model,
                overview: &overview,
                correctness: &correctness,
                votat: &walked.votat,
            },
            &walked.records,
        );

        log::info!(
            "Finished {} with {}: {} actions, exploration={:?}, control={:?}",
            properties.subject,
            properties.item,
            walked.records.len(),
            correctness.exploration,
            correctness.control.overall
        );

        Ok(ParsedLog {
            properties,
            start_time,
            model,
            actions: walked.records,
            aggregates,
            correctness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParserError;

    #[test]
    fn test_missing_file() {
        let parser = LogParser::default();
        let result = parser.parse_file(Path::new("nonexistent_scoring.xml"));
        assert!(matches!(result, Err(ParserError::IoError(_))));
    }

    #[test]
    fn test_not_xml() {
        let parser = LogParser::default();
        assert!(matches!(parser.parse_str("not xml <"), Err(ParserError::Xml(_))));
    }

    #[test]
    fn test_missing_runtime_model() {
        let xml = r#"<log>
  <tracesOverview>
    <logEntry><logEntry user="S01" entryPoint="Handball" test="CPS">
      <designMicrodynModel/>
    </logEntry></logEntry>
    <logEntry/>
    <logEntry timeStamp="2017-06-21T10:00:00.000+0200"/>
  </tracesOverview>
  <microdynOverview explorationTime="1" controlTime="1"/>
</log>"#;
        let result = LogParser::default().parse_str(xml);
        assert!(matches!(result, Err(ParserError::MalformedLog(_))));
    }
}
