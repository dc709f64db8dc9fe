//! Outcome of one simulation step.

use serde::{Deserialize, Serialize};

/// Result of a single `simulate` call.
///
/// `Running` keeps the driving loop going; `Success` and `Failure` are
/// terminal and never retried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SimResult {
    Running,
    /// Terminal win. Some games attach a reason (e.g. "max turns reached").
    Success(Option<String>),
    Failure(String),
}

impl SimResult {
    #[must_use]
    pub fn success() -> Self {
        SimResult::Success(None)
    }

    #[must_use]
    pub fn success_because(reason: impl Into<String>) -> Self {
        SimResult::Success(Some(reason.into()))
    }

    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        SimResult::Failure(reason.into())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, SimResult::Running)
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            SimResult::Running => None,
            SimResult::Success(reason) => reason.as_deref(),
            SimResult::Failure(reason) => Some(reason),
        }
    }
}

impl std::fmt::Display for SimResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimResult::Running => write!(f, "running"),
            SimResult::Success(None) => write!(f, "success"),
            SimResult::Success(Some(reason)) => write!(f, "success ({reason})"),
            SimResult::Failure(reason) => write!(f, "failure: {reason}"),
        }
    }
}
