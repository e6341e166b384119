// crates/warden-harness/src/runner.rs
// ============================================================================
// Module: Warden Task Runner
// Description: Headless subprocess execution with hard timeouts.
// Purpose: Run suite tasks against an external agent binary and collect
//          normalized results and violations.
// Dependencies: crate::{assertions, output, suite}, warden-core
// ============================================================================

//! ## Overview
//! The runner spawns the headless agent as a pre-parsed `(executable, args)`
//! vector, never through a shell. Stdin is isolated; stdout and stderr are
//! captured on reader threads to avoid pipe deadlock. A task that outlives
//! its timeout is killed, its stdout is not parsed, and the task fails with
//! a `timeout` violation. Subprocess failure never invalidates the harness
//! run itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use warden_core::Violation;

use crate::assertions::evaluate_assertions;
use crate::output::HeadlessOutput;
use crate::suite::TaskSpec;
use crate::suite::TaskSuite;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Poll interval while waiting on the subprocess.
const WAIT_POLL: Duration = Duration::from_millis(10);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the task runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The subprocess could not be spawned.
    #[error("failed to spawn '{program}': {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error message.
        message: String,
    },
}

// ============================================================================
// SECTION: Command Construction
// ============================================================================

/// Pre-parsed command for the headless agent.
///
/// # Invariants
/// - Arguments are passed as a vector; the command is never reassembled
///   into a shell string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    /// Executable path or name.
    pub program: String,
    /// Arguments preceding the prompt.
    pub args: Vec<String>,
}

impl TaskCommand {
    /// Creates a command from a program and fixed arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Single-quotes a prompt for any pass-through layer that requires one
/// string, escaping embedded quotes as `'\''`.
///
/// The runner itself never uses this: it passes arguments as a vector. The
/// helper exists for collaborators that must embed the prompt into another
/// quoting layer.
#[must_use]
pub fn quote_prompt_argument(prompt: &str) -> String {
    format!("'{}'", prompt.replace('\'', r"'\''"))
}

// ============================================================================
// SECTION: Task Outcomes
// ============================================================================

/// Result of running one task.
///
/// # Invariants
/// - `passed` is `true` iff the violation count is within the task budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    /// Task identifier.
    pub task_id: String,
    /// Whether the task passed.
    pub passed: bool,
    /// Violations recorded for the task.
    pub violations: Vec<Violation>,
    /// Parsed output; `None` on timeout.
    pub output: Option<HeadlessOutput>,
    /// Subprocess exit code when it exited normally.
    pub exit_code: Option<i32>,
    /// Captured stderr.
    pub stderr: String,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of running a whole suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteOutcome {
    /// Per-task outcomes in suite order.
    pub outcomes: Vec<TaskOutcome>,
    /// Number of passed tasks.
    pub passed: usize,
    /// Number of failed tasks.
    pub failed: usize,
}

// ============================================================================
// SECTION: Task Runner
// ============================================================================

/// Headless task runner.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    /// Command template; the task prompt is appended as the final argument.
    command: TaskCommand,
}

impl TaskRunner {
    /// Creates a runner over a command template.
    #[must_use]
    pub const fn new(command: TaskCommand) -> Self {
        Self {
            command,
        }
    }

    /// Runs every task in a suite sequentially.
    #[must_use]
    pub fn run_suite(&self, suite: &TaskSuite) -> SuiteOutcome {
        let outcomes: Vec<TaskOutcome> =
            suite.tasks.iter().map(|task| self.run_task(task)).collect();
        let passed = outcomes.iter().filter(|outcome| outcome.passed).count();
        let failed = outcomes.len() - passed;
        SuiteOutcome {
            outcomes,
            passed,
            failed,
        }
    }

    /// Runs one task: spawn, wait with timeout, parse, assert.
    ///
    /// Spawn failures and timeouts fail the task with a violation; they do
    /// not abort the suite.
    #[must_use]
    pub fn run_task(&self, task: &TaskSpec) -> TaskOutcome {
        let started = Instant::now();
        let child = match self.spawn(task) {
            Ok(child) => child,
            Err(err) => {
                let violation = Violation::new("spawn-failed", err.to_string());
                return TaskOutcome {
                    task_id: task.id.clone(),
                    passed: false,
                    violations: vec![violation],
                    output: None,
                    exit_code: None,
                    stderr: String::new(),
                    duration_ms: elapsed_ms(started),
                };
            }
        };

        let waited = wait_with_timeout(child, Duration::from_millis(task.timeout_ms));
        let duration_ms = elapsed_ms(started);

        match waited {
            WaitResult::TimedOut {
                stderr,
            } => TaskOutcome {
                task_id: task.id.clone(),
                passed: false,
                violations: vec![Violation::new(
                    "timeout",
                    format!("Task exceeded its {} ms timeout and was killed", task.timeout_ms),
                )],
                output: None,
                exit_code: None,
                stderr,
                duration_ms,
            },
            WaitResult::Exited {
                exit_code,
                stdout,
                stderr,
            } => {
                let output = HeadlessOutput::parse(&stdout);
                let mut violations = evaluate_assertions(task, &output);
                if exit_code != Some(0) {
                    violations.push(Violation::new(
                        "nonzero-exit",
                        format!("Headless process exited with {exit_code:?}"),
                    ));
                }
                let passed = violations.len() <= task.max_violations;
                TaskOutcome {
                    task_id: task.id.clone(),
                    passed,
                    violations,
                    output: Some(output),
                    exit_code,
                    stderr,
                    duration_ms,
                }
            }
        }
    }

    /// Spawns the subprocess with isolated stdin and piped output.
    fn spawn(&self, task: &TaskSpec) -> Result<Child, RunnerError> {
        let mut command = Command::new(&self.command.program);
        command
            .args(&self.command.args)
            .arg(&task.prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command.spawn().map_err(|err| RunnerError::Spawn {
            program: self.command.program.clone(),
            message: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Waiting
// ============================================================================

/// Result of waiting on the subprocess.
enum WaitResult {
    /// The process exited within the timeout.
    Exited {
        /// Exit code when available.
        exit_code: Option<i32>,
        /// Captured stdout.
        stdout: String,
        /// Captured stderr.
        stderr: String,
    },
    /// The process was killed after the timeout expired.
    TimedOut {
        /// Stderr captured up to the kill.
        stderr: String,
    },
}

/// Waits for the child with a hard timeout, capturing output on threads.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> WaitResult {
    let stdout_handle = child.stdout.take().map(spawn_reader);
    let stderr_handle = child.stderr.take().map(spawn_reader);
    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return WaitResult::Exited {
                    exit_code: status.code(),
                    stdout: join_reader(stdout_handle),
                    stderr: join_reader(stderr_handle),
                };
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Discard stdout: timed-out output is never parsed.
                    let _ = join_reader(stdout_handle);
                    return WaitResult::TimedOut {
                        stderr: join_reader(stderr_handle),
                    };
                }
                thread::sleep(WAIT_POLL);
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return WaitResult::Exited {
                    exit_code: None,
                    stdout: join_reader(stdout_handle),
                    stderr: join_reader(stderr_handle),
                };
            }
        }
    }
}

/// Spawns a reader thread draining one output pipe.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        let _ = pipe.read_to_string(&mut buffer);
        buffer
    })
}

/// Joins a reader thread, tolerating panics as empty output.
fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle.and_then(|handle| handle.join().ok()).unwrap_or_default()
}

/// Returns elapsed wall-clock milliseconds since `started`.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
