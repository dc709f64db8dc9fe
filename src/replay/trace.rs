//! Recorded traces: the authoritative command sequence and the state fields
//! expected after each command.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::CatalogEntry;

/// A recorded game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Test case the trace starts from. Defaults to the trace's own name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case: Option<String>,
    #[serde(default)]
    pub cg_trace: Vec<TraceEntry>,
}

impl Trace {
    /// A trace is multi-agent when its first entry carries `commands`.
    #[must_use]
    pub fn is_multi_agent(&self) -> bool {
        self.cg_trace.first().is_some_and(|entry| entry.commands.is_some())
    }

    /// Test case to load, falling back to `trace_name`.
    #[must_use]
    pub fn test_case_or<'a>(&'a self, trace_name: &'a str) -> &'a str {
        self.test_case.as_deref().unwrap_or(trace_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cg_trace.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cg_trace.is_empty()
    }
}

impl CatalogEntry for Trace {
    fn title(&self) -> Option<&str> {
        self.test_case.as_deref()
    }
}

/// One turn of a trace.
///
/// Every key other than `turn`, `command` and `commands` is an expected
/// state field, read by the model's `compare_state`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    #[serde(default)]
    pub turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<Option<String>>>,
    #[serde(flatten)]
    pub expected: Map<String, Value>,
}

impl TraceEntry {
    /// Single-agent entry.
    #[must_use]
    pub fn single(turn: u32, command: impl Into<String>) -> Self {
        Self {
            turn,
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Multi-agent entry; `None` means the player sent nothing.
    #[must_use]
    pub fn multi(turn: u32, commands: Vec<Option<String>>) -> Self {
        Self {
            turn,
            commands: Some(commands),
            ..Self::default()
        }
    }

    /// Builder: add an expected field.
    #[must_use]
    pub fn expect(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.expected.insert(field.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.expected.get(name)
    }

    /// Expected integer field. Floats recorded by the reference engine are
    /// truncated toward zero.
    #[must_use]
    pub fn int_field(&self, name: &str) -> Option<i64> {
        let value = self.expected.get(name)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f.trunc() as i64))
    }

    /// Expected integer list field, e.g. `"pos": [3, 7]`.
    #[must_use]
    pub fn int_list(&self, name: &str) -> Option<Vec<i64>> {
        self.expected.get(name)?.as_array()?.iter().map(Value::as_i64).collect()
    }

    /// Per-player command lines for this turn, one slot per player.
    ///
    /// A single-agent entry yields one slot. A multi-line slot holds
    /// several commands separated by newlines.
    #[must_use]
    pub fn player_commands(&self) -> Vec<Option<&str>> {
        match (&self.commands, &self.command) {
            (Some(commands), _) => commands.iter().map(Option::as_deref).collect(),
            (None, command) => vec![command.as_deref()],
        }
    }
}
