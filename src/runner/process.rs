//! One player program running as a child process.
//!
//! Threads per process:
//!
//! - **stdout reader**: reads lines and forwards them into an `mpsc`
//!   channel. The runner waits on the channel with `recv_timeout`; a line
//!   that arrives after its deadline is simply never received.
//! - **stderr drain**: reads stderr continuously so the child never stalls
//!   on a full pipe, keeps the last few lines for reports and optionally
//!   echoes them to the log.
//!
//! The runner thread is the only writer to the child's stdin.

use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::config::RunnerConfig;
use crate::core::{HarnessError, HarnessResult, PlayerId};

/// Program and arguments for one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ProgramSpec {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on whitespace. No quoting rules.
    pub fn parse(command_line: &str) -> HarnessResult<Self> {
        let mut words = command_line.split_whitespace();
        let program = words.next().ok_or(HarnessError::EmptyCommand)?;
        Ok(Self::new(program, words))
    }

    /// Build from already-split words. A single word containing spaces is
    /// split again, so `"python3 bot.py"` passed as one argument works.
    pub fn from_words(words: &[String]) -> HarnessResult<Self> {
        match words {
            [] => Err(HarnessError::EmptyCommand),
            [single] => Self::parse(single),
            [program, args @ ..] => Ok(Self::new(program.clone(), args.iter().cloned())),
        }
    }
}

impl fmt::Display for ProgramSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Outcome of waiting for one output line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    Timeout,
    /// stdout reached end of file.
    Closed,
}

/// A spawned player program.
pub struct PlayerProcess {
    player: PlayerId,
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
}

impl PlayerProcess {
    /// Spawn the program with piped stdio and start its reader threads.
    pub fn spawn(
        player: PlayerId,
        spec: &ProgramSpec,
        config: &RunnerConfig,
    ) -> HarnessResult<Self> {
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: spec.to_string(),
                source,
            })?;
        debug!("{player}: spawned '{spec}' (pid {})", child.id());

        let stdin = child.stdin.take();
        let (tx, lines) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            thread::spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }

        let stderr_tail = Arc::new(Mutex::new(VecDeque::with_capacity(config.stderr_tail)));
        if let Some(stderr) = child.stderr.take() {
            let tail = Arc::clone(&stderr_tail);
            let capacity = config.stderr_tail;
            let echo = config.echo_stderr;
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines() {
                    let Ok(line) = line else { break };
                    if echo {
                        debug!("{player} stderr: {line}");
                    }
                    if capacity == 0 {
                        continue;
                    }
                    if let Ok(mut tail) = tail.lock() {
                        if tail.len() == capacity {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                }
            });
        }

        Ok(Self {
            player,
            child,
            stdin,
            lines,
            stderr_tail,
        })
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Write lines to the program's stdin and flush.
    pub fn send_lines(&mut self, lines: &[String]) -> std::io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin already closed")
            })?;
        for line in lines {
            debug!("{} <- {line}", self.player);
            writeln!(stdin, "{line}")?;
        }
        stdin.flush()
    }

    /// Wait up to `timeout` for the next stdout line.
    pub fn read_line(&self, timeout: Duration) -> LineRead {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => {
                debug!("{} -> {line}", self.player);
                LineRead::Line(line)
            }
            Err(RecvTimeoutError::Timeout) => LineRead::Timeout,
            Err(RecvTimeoutError::Disconnected) => LineRead::Closed,
        }
    }

    /// Last stderr lines seen so far.
    #[must_use]
    pub fn stderr_tail(&self) -> Vec<String> {
        self.stderr_tail
            .lock()
            .map(|tail| tail.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Close stdin, ask the program to terminate, then kill it once `grace`
    /// has passed.
    pub fn shutdown(&mut self, grace: Duration) {
        drop(self.stdin.take());
        if self.has_exited() {
            return;
        }

        self.request_terminate();
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if self.has_exited() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }

        warn!("{}: still running after {grace:?}, killing", self.player);
        if let Err(err) = self.child.kill() {
            debug!("{}: kill failed: {err}", self.player);
        }
        let _ = self.child.wait();
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    #[cfg(unix)]
    fn request_terminate(&self) {
        let Ok(pid) = libc::pid_t::try_from(self.child.id()) else {
            return;
        };
        // SAFETY: `pid` is our own child, which has not been reaped yet.
        unsafe {
            libc::kill(pid, libc::SIGTERM);
        }
    }

    #[cfg(not(unix))]
    fn request_terminate(&self) {}
}

impl Drop for PlayerProcess {
    fn drop(&mut self) {
        if !self.has_exited() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl fmt::Debug for PlayerProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerProcess")
            .field("player", &self.player)
            .field("pid", &self.child.id())
            .finish()
    }
}
