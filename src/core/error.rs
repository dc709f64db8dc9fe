//! Harness error types.
//!
//! Rules violations are not errors: they show up as [`SimResult`] values or
//! skipped sub-commands. These types cover malformed program output and
//! harness-level faults (missing fixtures, spawn failures, bad JSON).
//!
//! [`SimResult`]: crate::core::SimResult

use std::path::PathBuf;

use thiserror::Error;

/// A program output line that could not be turned into a command.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cannot parse '{line}': {reason}")]
pub struct ParseError {
    pub line: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

/// Parse a whitespace token as an integer, naming the field on failure.
pub(crate) fn parse_int<T: std::str::FromStr>(
    line: &str,
    token: Option<&str>,
    field: &str,
) -> Result<T, ParseError> {
    let token = token.ok_or_else(|| ParseError::new(line, format!("missing {field}")))?;
    token
        .parse()
        .map_err(|_| ParseError::new(line, format!("{field} is not an integer: '{token}'")))
}

/// Errors raised by the harness itself.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("unknown test case '{name}' for model {model}")]
    TestCaseNotFound { model: &'static str, name: String },

    #[error("unknown trace '{name}' for model {model}")]
    TraceNotFound { model: &'static str, name: String },

    #[error("invalid test case '{name}': {reason}")]
    InvalidTestCase { name: String, reason: String },

    #[error("trace is invalid: {0}")]
    InvalidTrace(String),

    #[error("{model} needs {expected} player program(s), got {got}")]
    PlayerCountMismatch {
        model: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("empty program command line")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_reports_field() {
        let err = parse_int::<i32>("1 x", Some("x"), "power").unwrap_err();
        assert!(err.reason.contains("power"));
        let err = parse_int::<i32>("1", None, "power").unwrap_err();
        assert_eq!(err.reason, "missing power");
        assert_eq!(parse_int::<i32>("7", Some("7"), "power").unwrap(), 7);
    }

    #[test]
    fn test_error_messages() {
        let err = HarnessError::TestCaseNotFound {
            model: "mars_lander",
            name: "cave".into(),
        };
        assert_eq!(err.to_string(), "unknown test case 'cave' for model mars_lander");

        let err: HarnessError = ParseError::new("FOO", "unknown action").into();
        assert_eq!(err.to_string(), "cannot parse 'FOO': unknown action");
    }
}
