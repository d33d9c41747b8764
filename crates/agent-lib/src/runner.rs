//! Script execution with timeout enforcement
//!
//! Runs an operator-supplied script body in a child process and converts
//! every way the process can fail into a uniform [`TaskExecutionResult`]:
//! nonzero exit, wall-clock timeout, missing interpreter, unsupported
//! script type. Nothing here returns an error to the caller.

use crate::models::{TaskExecutionResult, TaskStatus};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code reported when a task exceeds its wall-clock timeout, matching
/// the shell `timeout(1)` convention callers branch on.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported for launch failures and unsupported script types.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 1;

/// Default timeout applied when a caller does not supply one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Task execution engine. Stateless: each invocation owns its child process
/// for exactly one call, so concurrent runs are independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRunner;

impl TaskRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a script body and report a fully populated result.
    ///
    /// `script_type` selects the interpreter: `bash` and `python` wrap the
    /// body as a `-c` argument; `shell` tokenizes the body as a literal
    /// argv with shell quoting rules and no further interpretation. The
    /// child sees exactly `env`; the ambient environment is not inherited.
    pub async fn run_script(
        &self,
        script: &str,
        script_type: &str,
        timeout: Duration,
        env: &HashMap<String, String>,
    ) -> TaskExecutionResult {
        let started = Instant::now();

        let argv = match build_argv(script, script_type) {
            Ok(argv) => argv,
            Err(reason) => {
                debug!(script_type = %script_type, "Refusing to launch: {reason}");
                return failure(LAUNCH_FAILURE_EXIT_CODE, reason, started.elapsed());
            }
        };

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return failure(
                    LAUNCH_FAILURE_EXIT_CODE,
                    format!("failed to launch {}: {}", argv[0], err),
                    started.elapsed(),
                )
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                // Death by signal carries no exit code; report the generic
                // failure code rather than inventing one
                let exit_code = output.status.code().unwrap_or(LAUNCH_FAILURE_EXIT_CODE);
                TaskExecutionResult {
                    status: if output.status.success() {
                        TaskStatus::Success
                    } else {
                        TaskStatus::Failed
                    },
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code,
                    duration_seconds: started.elapsed().as_secs_f64(),
                }
            }
            Ok(Err(err)) => failure(
                LAUNCH_FAILURE_EXIT_CODE,
                format!("failed to collect task output: {err}"),
                started.elapsed(),
            ),
            // Dropping the wait future kills the child (kill_on_drop)
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Task exceeded timeout, terminating");
                failure(
                    TIMEOUT_EXIT_CODE,
                    format!("task timed out after {} seconds", timeout.as_secs()),
                    started.elapsed(),
                )
            }
        }
    }
}

fn build_argv(script: &str, script_type: &str) -> Result<Vec<String>, String> {
    match script_type {
        "bash" => Ok(vec!["bash".into(), "-c".into(), script.into()]),
        "python" => Ok(vec!["python3".into(), "-c".into(), script.into()]),
        "shell" => match shell_words::split(script) {
            Ok(argv) if !argv.is_empty() => Ok(argv),
            Ok(_) => Err("empty command line".to_string()),
            Err(err) => Err(format!("cannot tokenize command line: {err}")),
        },
        other => Err(format!("Unsupported script type: {other}")),
    }
}

fn failure(exit_code: i32, stderr: String, elapsed: Duration) -> TaskExecutionResult {
    TaskExecutionResult {
        status: TaskStatus::Failed,
        stdout: String::new(),
        stderr,
        exit_code,
        duration_seconds: elapsed.as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_successful_script() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script("echo -n hello", "bash", Duration::from_secs(10), &no_env())
            .await;

        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.stderr, "");
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_failed() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script("exit 7", "bash", Duration::from_secs(10), &no_env())
            .await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.exit_code, 7);
    }

    #[tokio::test]
    async fn test_stderr_is_captured() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script("echo oops >&2; exit 3", "bash", Duration::from_secs(10), &no_env())
            .await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.stdout, "");
    }

    #[tokio::test]
    async fn test_timeout_kills_child_and_reports_124() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script("sleep 5", "bash", Duration::from_secs(1), &no_env())
            .await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
        assert!(result.stderr.contains("timed out"));
        assert!(result.duration_seconds >= 1.0);
        assert!(result.duration_seconds < 2.5);
    }

    #[tokio::test]
    async fn test_unsupported_script_type_short_circuits() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script("puts 'hi'", "ruby", Duration::from_secs(10), &no_env())
            .await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.exit_code, LAUNCH_FAILURE_EXIT_CODE);
        assert!(result.stderr.contains("Unsupported script type: ruby"));
        assert_eq!(result.stdout, "");
    }

    #[tokio::test]
    async fn test_shell_type_respects_quoting() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script(
                "/bin/echo 'hello world' again",
                "shell",
                Duration::from_secs(10),
                &no_env(),
            )
            .await;

        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.stdout, "hello world again\n");
    }

    #[tokio::test]
    async fn test_shell_type_empty_body_is_launch_failure() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script("   ", "shell", Duration::from_secs(10), &no_env())
            .await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.exit_code, LAUNCH_FAILURE_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_launch_failure() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script(
                "/nonexistent/interpreter --version",
                "shell",
                Duration::from_secs(10),
                &no_env(),
            )
            .await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.exit_code, LAUNCH_FAILURE_EXIT_CODE);
        assert!(result.stderr.contains("failed to launch"));
    }

    #[tokio::test]
    async fn test_environment_replaces_ambient() {
        std::env::set_var("PULSE_RUNNER_AMBIENT", "leaked");

        let mut env = HashMap::new();
        env.insert("PULSE_RUNNER_GIVEN".to_string(), "present".to_string());

        let runner = TaskRunner::new();
        let result = runner
            .run_script(
                r#"echo -n "$PULSE_RUNNER_GIVEN:$PULSE_RUNNER_AMBIENT""#,
                "bash",
                Duration::from_secs(10),
                &env,
            )
            .await;

        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.stdout, "present:");
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_independent() {
        let runner = TaskRunner::new();
        let (a, b) = tokio::join!(
            runner.run_script("echo -n one", "bash", Duration::from_secs(10), &no_env()),
            runner.run_script("exit 2", "bash", Duration::from_secs(10), &no_env()),
        );

        assert_eq!(a.stdout, "one");
        assert_eq!(a.exit_code, 0);
        assert_eq!(b.exit_code, 2);
    }

    #[tokio::test]
    async fn test_duration_is_measured_on_success() {
        let runner = TaskRunner::new();
        let result = runner
            .run_script("sleep 0.2", "bash", Duration::from_secs(10), &no_env())
            .await;

        assert_eq!(result.status, TaskStatus::Success);
        assert!(result.duration_seconds >= 0.2);
    }
}
