//! Runner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the runner drives player programs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Time allowed for each output line, in milliseconds.
    pub turn_timeout_ms: u64,

    /// Time allowed on the first turn, when programs usually set up.
    /// `None` uses `turn_timeout_ms`.
    pub first_turn_timeout_ms: Option<u64>,

    /// Turns played before the run is cut off.
    pub max_turns: u32,

    /// Forward program stderr to the log at debug level.
    pub echo_stderr: bool,

    /// Wait between the terminate request and the kill, in milliseconds.
    pub shutdown_grace_ms: u64,

    /// Stderr lines kept per program for the final report.
    pub stderr_tail: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            turn_timeout_ms: 150,
            first_turn_timeout_ms: None,
            max_turns: 500,
            echo_stderr: false,
            shutdown_grace_ms: 1000,
            stderr_tail: 20,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-line timeout.
    pub fn with_turn_timeout_ms(mut self, ms: u64) -> Self {
        self.turn_timeout_ms = ms;
        self
    }

    /// Set a separate timeout for the first turn.
    pub fn with_first_turn_timeout_ms(mut self, ms: u64) -> Self {
        self.first_turn_timeout_ms = Some(ms);
        self
    }

    /// Set the turn limit.
    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_echo_stderr(mut self, echo: bool) -> Self {
        self.echo_stderr = echo;
        self
    }

    pub fn with_shutdown_grace_ms(mut self, ms: u64) -> Self {
        self.shutdown_grace_ms = ms;
        self
    }

    pub fn with_stderr_tail(mut self, lines: usize) -> Self {
        self.stderr_tail = lines;
        self
    }

    /// Timeout in force for `turn` (1-based).
    #[must_use]
    pub fn timeout_ms_for(&self, turn: u32) -> u64 {
        match self.first_turn_timeout_ms {
            Some(ms) if turn <= 1 => ms,
            _ => self.turn_timeout_ms,
        }
    }

    #[must_use]
    pub fn timeout_for(&self, turn: u32) -> Duration {
        Duration::from_millis(self.timeout_ms_for(turn))
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.turn_timeout_ms, 150);
        assert_eq!(config.max_turns, 500);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(1));
        assert_eq!(config.timeout_ms_for(1), 150);
    }

    #[test]
    fn test_first_turn_timeout() {
        let config = RunnerConfig::new()
            .with_turn_timeout_ms(50)
            .with_first_turn_timeout_ms(1000);
        assert_eq!(config.timeout_ms_for(1), 1000);
        assert_eq!(config.timeout_ms_for(2), 50);
        assert_eq!(config.timeout_for(3), Duration::from_millis(50));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = RunnerConfig::new().with_max_turns(42).with_echo_stderr(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: RunnerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
