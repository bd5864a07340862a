//! Typed access to a parsed MicroDyn trace log
//!
//! The trace log is an XML document with this layout (only the parts the
//! decoder relies on are shown):
//!
//! ```text
//! <root>
//!   <tracesOverview>
//!     <logEntry ...>                        top-level entries, in time order
//!       <logEntry user=".." entryPoint=".." test="..">
//!         <designMicrodynModel> variables + dependencies </designMicrodynModel>
//!       </logEntry>
//!     </logEntry>
//!     ...
//!     <logEntry ...>
//!       <logEntry> <runtimeMicrodynModel> dependencies </runtimeMicrodynModel> </logEntry>
//!     </logEntry>
//!   </tracesOverview>
//!   <microdynOverview explorationTime=".." controlTime=".."/>
//! </root>
//! ```
//!
//! Every lookup that is required for decoding fails with
//! [`ParserError::MalformedLog`] when the element or attribute is absent.

use crate::types::{ParserError, Phase, Result, TaskProperties, Timestamp};
use chrono::{DateTime, NaiveDateTime};
use roxmltree::{Document, Node};
use std::str::FromStr;

const TRACES_OVERVIEW: &str = "tracesOverview";
const LOG_ENTRY: &str = "logEntry";
const DESIGN_MODEL: &str = "designMicrodynModel";
const RUNTIME_MODEL: &str = "runtimeMicrodynModel";
const TASK_OVERVIEW: &str = "microdynOverview";

/// Per-phase timing from the task overview
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskOverview {
    /// Exploration time in seconds, excluding instructions
    pub exploration_time: f64,
    /// Control time in seconds, excluding instructions
    pub control_time: f64,
}

impl TaskOverview {
    pub fn duration(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Exploration => self.exploration_time,
            Phase::Control => self.control_time,
        }
    }
}

/// Read-only view over one trace log document
pub struct LogTree<'a, 'input> {
    root: Node<'a, 'input>,
    traces: Node<'a, 'input>,
}

impl<'a, 'input> LogTree<'a, 'input> {
    /// Wrap a parsed document, locating the traces overview
    pub fn new(doc: &'a Document<'input>) -> Result<Self> {
        let root = doc.root_element();
        let traces = child_element(root, TRACES_OVERVIEW).ok_or_else(|| {
            ParserError::malformed(format!("Missing <{}> element", TRACES_OVERVIEW))
        })?;
        Ok(Self { root, traces })
    }

    /// Top-level log entries in document order
    pub fn entries(&self) -> impl Iterator<Item = Node<'a, 'input>> {
        self.traces
            .children()
            .filter(|n| n.is_element() && n.has_tag_name(LOG_ENTRY))
    }

    /// Entries one level below the top-level entries
    fn nested_entries(&self) -> impl Iterator<Item = Node<'a, 'input>> {
        self.entries().flat_map(|entry| {
            entry
                .children()
                .filter(|n| n.is_element() && n.has_tag_name(LOG_ENTRY))
        })
    }

    /// Subject, item and test identifiers from the first identifying entry
    pub fn properties(&self) -> Result<TaskProperties> {
        let entry = self
            .nested_entries()
            .find(|n| n.has_attribute("user"))
            .ok_or_else(|| ParserError::malformed("No log entry carries a 'user' attribute"))?;

        Ok(TaskProperties {
            subject: required_attr(entry, "user")?.to_string(),
            item: required_attr(entry, "entryPoint")?.to_string(),
            test: required_attr(entry, "test")?.to_string(),
        })
    }

    /// Start timestamp, read from the top-level entry at `index`
    pub fn start_time(&self, index: usize) -> Result<Timestamp> {
        let entry = self.entries().nth(index).ok_or_else(|| {
            ParserError::malformed(format!("No top-level log entry at index {}", index))
        })?;
        parse_timestamp(required_attr(entry, "timeStamp")?)
    }

    /// Design-time causal model subtree
    pub fn design_model(&self) -> Result<Node<'a, 'input>> {
        self.model_subtree(DESIGN_MODEL)
    }

    /// Runtime (post-task) model subtree holding the subject's dependencies
    pub fn runtime_model(&self) -> Result<Node<'a, 'input>> {
        self.model_subtree(RUNTIME_MODEL)
    }

    fn model_subtree(&self, name: &str) -> Result<Node<'a, 'input>> {
        self.nested_entries()
            .find_map(|entry| child_element(entry, name))
            .ok_or_else(|| ParserError::malformed(format!("Missing <{}> element", name)))
    }

    /// Per-phase timing from the task overview
    pub fn overview(&self) -> Result<TaskOverview> {
        let overview = child_element(self.root, TASK_OVERVIEW).ok_or_else(|| {
            ParserError::malformed(format!("Missing <{}> element", TASK_OVERVIEW))
        })?;

        Ok(TaskOverview {
            exploration_time: duration_attr(overview, "explorationTime")?,
            control_time: duration_attr(overview, "controlTime")?,
        })
    }
}

/// All elements of a subtree in document order, starting with `node` itself
pub fn descendants<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants().filter(|n| n.is_element())
}

/// Descendant elements of `node` with local name `name`
pub fn elements_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    descendants(node).filter(move |n| n.has_tag_name(name))
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
}

/// Attribute value, or `MalformedLog` if absent
pub fn required_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        ParserError::malformed(format!(
            "<{}> is missing attribute '{}'",
            node.tag_name().name(),
            name
        ))
    })
}

/// Numeric attribute value; absent → `MalformedLog`, unparseable → `ValueFormat`
pub fn number_attr<T: FromStr>(node: Node<'_, '_>, name: &str) -> Result<T> {
    let raw = required_attr(node, name)?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| ParserError::value_format(name, raw))
}

/// Phase time in seconds; must be finite and non-negative
fn duration_attr(node: Node<'_, '_>, name: &str) -> Result<f64> {
    let secs: f64 = number_attr(node, name)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ParserError::value_format(name, required_attr(node, name)?));
    }
    Ok(secs)
}

/// Parse a log timestamp such as `2017-06-21T09:51:38.416+0200`
///
/// The UTC offset is dropped: the result is the wall-clock time as logged.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp> {
    let trimmed = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(with_offset.naive_local());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| ParserError::value_format("timeStamp", raw))
}
