//! MicroDyn Log Decoder Library
//!
//! A stateless, reusable library for decoding trace logs of MicroDyn-style
//! complex problem-solving items into an action stream and per-phase
//! summaries.
//!
//! # Architecture
//!
//! Each log file is decoded on its own, in one pass:
//! - Reads the item's causal model (inputs, outputs, eigendynamics, ground truth)
//! - Walks every log entry and emits one action record per interaction
//! - Classifies each confirmed apply action as NOTAT, VOTAT, HOTAT or CA
//! - Scores exploration (dependency graph) and control (output targets)
//! - Summarizes each phase
//!
//! The library does NOT:
//! - Discover or filter input files
//! - Write CSV output or pivot tables
//! - Carry state between files
//!
//! All file-system and batch functionality is in the application layer
//! (microdyn-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use microdyn_log_decoder::{IndeterminatePolicy, LogParser, ParserConfig};
//! use std::path::Path;
//!
//! let config = ParserConfig::new()
//!     .with_indeterminate_policy(IndeterminatePolicy::Propagate);
//! let parser = LogParser::new(config);
//!
//! match parser.parse_file(Path::new("data/S01_Handball_scoring.xml")) {
//!     Ok(parsed) => {
//!         for action in &parsed.actions {
//!             println!("{:>8.3}s {} {}", action.elapsed_secs, action.kind, action.label);
//!         }
//!     }
//!     Err(e) => eprintln!("Skipping file: {}", e),
//! }
//! ```

// Public modules
pub mod aggregate;
pub mod config;
pub mod log_tree;
pub mod model;
pub mod parser;
pub mod scoring;
pub mod strategy;
pub mod types;
pub mod walker;

// Re-export main types for convenience
pub use config::{ActionTypeTable, ParserConfig};
pub use model::{CausalModel, Threshold, Variable, VariableNaming, VariableRole, VariableRoles};
pub use parser::{LogParser, ParsedLog};
pub use scoring::{ControlScore, Correctness, IndeterminatePolicy, VariableScore};
pub use strategy::VotatCoverage;
pub use types::{
    ActionKind, ActionRecord, AggregateRecord, Edge, Outcome, ParserError, Phase, Result,
    Strategy, TaskProperties, Timestamp, VariableSnapshot,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
