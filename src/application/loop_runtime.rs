//! Lifecycle control for the external auto-loop driver process.
//!
//! The driver is a long-lived child process, one per output directory.
//! Liveness is reconstructed from disk (PID file plus signal-0 probe) on
//! every call rather than held in memory, because the supervising tool
//! itself may restart between `start` and `status`. The probe is advisory,
//! not atomic: callers owning automation must serialize start/stop per
//! output directory themselves.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CycleResult, FoundryConfig, LoopStatus, RawCycleLog, RuntimeStatus,
};
use crate::services::guardrails::GuardrailValidator;

/// Bounded wait for the external stop mechanism, in seconds.
const STOP_TIMEOUT_SECS: u64 = 90;

/// State file name inside the output directory.
const STATE_FILE: &str = ".auto-loop-state";
/// PID file name inside the output directory.
const PID_FILE: &str = ".auto-loop.pid";
/// Driver script names inside the output directory's scripts/.
const LOOP_SCRIPT: &str = "auto-loop.sh";
const STOP_SCRIPT: &str = "stop-loop.sh";

static CYCLE_LOG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cycle-(\d+)\.log$").unwrap());

/// Supervisor for the auto-loop process of one output directory.
#[derive(Debug, Clone)]
pub struct LoopRuntime {
    output_dir: PathBuf,
}

impl LoopRuntime {
    /// Create a supervisor rooted at an output directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The supervised output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn state_path(&self) -> PathBuf {
        self.output_dir.join(STATE_FILE)
    }

    fn pid_path(&self) -> PathBuf {
        self.output_dir.join(PID_FILE)
    }

    fn logs_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }

    fn script_path(&self, name: &str) -> PathBuf {
        self.output_dir.join("scripts").join(name)
    }

    /// Start the auto-loop driver. Returns the child PID.
    ///
    /// The environment passed to the driver is derived from the
    /// configuration's first provider and runtime settings. In foreground
    /// mode the call blocks until the child's standard streams are fully
    /// captured; in background mode the child is detached into its own
    /// process group and the call returns immediately.
    pub async fn start(&self, config: &FoundryConfig, foreground: bool) -> DomainResult<u32> {
        let script = self.script_path(LOOP_SCRIPT);
        if !script.is_file() {
            return Err(DomainError::MissingDriver(script));
        }

        let command_line = format!("bash {}", script.display());
        let (safe, reason) =
            GuardrailValidator::new().check_command_safety(&command_line, &config.guardrails);
        if !safe {
            return Err(DomainError::UnsafeCommand { reason });
        }

        if self.is_running() {
            return Err(DomainError::AlreadyRunning);
        }

        let mut command = Command::new("bash");
        command.arg(&script);
        for (key, value) in self.build_env(config) {
            command.env(key, value);
        }

        if foreground {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
            let mut child = command.spawn()?;
            let pid = child.id().unwrap_or_default();
            info!(pid, "Auto-loop started in foreground");

            let stdout = child.stdout.take();
            let stderr = child.stderr.take();
            let (_, _, status) = tokio::join!(
                drain_lines(stdout, false),
                drain_lines(stderr, true),
                child.wait(),
            );
            match status {
                Ok(status) => info!(?status, "Auto-loop exited"),
                Err(err) => warn!(error = ?err, "Error waiting for auto-loop"),
            }
            Ok(pid)
        } else {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .process_group(0);
            let child = command.spawn()?;
            let pid = child.id().unwrap_or_default();
            info!(pid, "Auto-loop started in background");
            Ok(pid)
        }
    }

    /// Stop the running loop via the external stop mechanism.
    ///
    /// Blocks for at most 90 seconds; there is no cancellation path once
    /// issued. Fails with `StopFailed` on nonzero exit or timeout.
    pub async fn stop(&self, force: bool) -> DomainResult<()> {
        let script = self.script_path(STOP_SCRIPT);
        let mut command = Command::new("bash");
        command.arg(&script).arg("--output-dir").arg(&self.output_dir);
        if force {
            command.arg("--force");
        }

        let output = timeout(Duration::from_secs(STOP_TIMEOUT_SECS), command.output())
            .await
            .map_err(|_| DomainError::StopFailed {
                stderr: format!("stop mechanism timed out after {STOP_TIMEOUT_SECS}s"),
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            return Err(DomainError::StopFailed {
                stderr: if stderr.is_empty() { stdout } else { stderr },
            });
        }

        info!("Auto-loop stopped");
        Ok(())
    }

    /// Current runtime status, or `None` when no state file exists.
    ///
    /// Unparsable integers default to zero and missing strings to empty;
    /// one corrupt field never invalidates the whole record.
    pub fn status(&self) -> Option<RuntimeStatus> {
        let fields = parse_state_file(&self.state_path())?;

        Some(RuntimeStatus {
            loop_count: fields
                .iter()
                .find(|(k, _)| k == "cycle_count")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0),
            error_count: fields
                .iter()
                .find(|(k, _)| k == "error_count")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0),
            status: fields
                .iter()
                .find(|(k, _)| k == "status")
                .map_or(LoopStatus::Unknown, |(_, v)| LoopStatus::parse(v)),
            model: field_or_empty(&fields, "model"),
            engine: field_or_empty(&fields, "engine"),
            last_run: field_or_empty(&fields, "last_run"),
        })
    }

    /// Parse the cycle log with the numerically highest cycle number.
    pub fn latest_cycle(&self) -> Option<CycleResult> {
        let entries = std::fs::read_dir(self.logs_dir()).ok()?;

        let latest = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let number: u64 = CYCLE_LOG_RE
                    .captures(name.to_str()?)?
                    .get(1)?
                    .as_str()
                    .parse()
                    .ok()?;
                Some((number, entry.path()))
            })
            .max_by_key(|(number, _)| *number)?;

        let content = std::fs::read_to_string(latest.1).ok()?;
        Some(CycleResult::from_log(&RawCycleLog::parse(&content)))
    }

    /// Whether a live driver process is associated with this directory.
    ///
    /// True only when the PID file exists and the signal-0 probe reaches a
    /// process. Permission-denied on the probe means the process exists
    /// but is not ours to inspect — still reported as running, to avoid
    /// double-launch races. Everything else (missing file, unparsable PID,
    /// dead process) is false.
    pub fn is_running(&self) -> bool {
        let Ok(content) = std::fs::read_to_string(self.pid_path()) else {
            return false;
        };
        let Ok(pid) = content.trim().parse::<i32>() else {
            debug!(pid_file = %self.pid_path().display(), "Unparsable PID file");
            return false;
        };

        match kill(Pid::from_raw(pid), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    /// Environment overrides derived from the configuration.
    fn build_env(&self, config: &FoundryConfig) -> Vec<(String, String)> {
        let runtime = &config.runtime;
        let mut env = vec![
            ("OUTPUT_DIR".to_string(), self.output_dir.display().to_string()),
            ("CLAUDE_CODE_EXPERIMENTAL_AGENT_TEAMS".to_string(), "1".to_string()),
            ("LOOP_INTERVAL".to_string(), runtime.loop_interval.to_string()),
            ("CYCLE_TIMEOUT_SECONDS".to_string(), runtime.cycle_timeout.to_string()),
            (
                "MAX_CONSECUTIVE_ERRORS".to_string(),
                runtime.max_consecutive_errors.to_string(),
            ),
        ];

        if let Some(primary) = runtime.providers.first() {
            env.push(("ENGINE".to_string(), primary.engine.to_string()));
            env.push(("MODEL".to_string(), primary.model.clone()));
        }

        env
    }
}

/// Forward a child stream to the log, line by line, until EOF.
async fn drain_lines<R>(stream: Option<R>, is_stderr: bool)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(stream) = stream else { return };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!(target: "auto_loop", "{line}");
        } else {
            info!(target: "auto_loop", "{line}");
        }
    }
}

/// Parse a `key=value`-per-line state file.
///
/// Returns `None` when the file is missing, unreadable, or carries no
/// recognizable fields.
fn parse_state_file(path: &Path) -> Option<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path).ok()?;

    let fields: Vec<(String, String)> = content
        .trim()
        .lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

fn field_or_empty(fields: &[(String, String)], key: &str) -> String {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn runtime_in(dir: &Path) -> LoopRuntime {
        LoopRuntime::new(dir)
    }

    #[test]
    fn test_status_none_without_state_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(runtime_in(dir.path()).status().is_none());
    }

    #[test]
    fn test_status_parses_state_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(STATE_FILE),
            "cycle_count=12\nerror_count=2\nstatus=running\nmodel=opus\nengine=claude\nlast_run=2026-08-06T10:00:00\n",
        )
        .unwrap();

        let status = runtime_in(dir.path()).status().unwrap();
        assert_eq!(status.loop_count, 12);
        assert_eq!(status.error_count, 2);
        assert_eq!(status.status, LoopStatus::Running);
        assert_eq!(status.model, "opus");
        assert_eq!(status.engine, "claude");
        assert_eq!(status.last_run, "2026-08-06T10:00:00");
    }

    #[test]
    fn test_status_degrades_corrupt_fields_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(STATE_FILE),
            "cycle_count=banana\nstatus=confused\nnot a field line\n",
        )
        .unwrap();

        let status = runtime_in(dir.path()).status().unwrap();
        assert_eq!(status.loop_count, 0);
        assert_eq!(status.error_count, 0);
        assert_eq!(status.status, LoopStatus::Unknown);
        assert_eq!(status.model, "");
    }

    #[test]
    fn test_latest_cycle_none_without_logs_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(runtime_in(dir.path()).latest_cycle().is_none());
    }

    #[test]
    fn test_latest_cycle_orders_numerically_not_lexicographically() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir_all(&logs).unwrap();
        fs::write(logs.join("cycle-2.log"), "cycle: 2\nstatus: ok\n---\nold").unwrap();
        fs::write(logs.join("cycle-10.log"), "cycle: 10\nstatus: fail\n---\nnew").unwrap();
        fs::write(logs.join("not-a-cycle.log"), "ignored").unwrap();

        let latest = runtime_in(dir.path()).latest_cycle().unwrap();
        assert_eq!(latest.cycle_number, 10);
        assert_eq!(latest.summary, "new");
    }

    #[test]
    fn test_latest_cycle_preserves_absent_cost() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir_all(&logs).unwrap();
        fs::write(logs.join("cycle-1.log"), "cycle: 1\nstatus: ok\n---\n").unwrap();

        let latest = runtime_in(dir.path()).latest_cycle().unwrap();
        assert_eq!(latest.cost_usd, None);
    }

    #[test]
    fn test_is_running_false_without_pid_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!runtime_in(dir.path()).is_running());
    }

    #[test]
    fn test_is_running_false_for_garbage_pid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PID_FILE), "not-a-pid\n").unwrap();
        assert!(!runtime_in(dir.path()).is_running());
    }

    #[test]
    fn test_is_running_true_for_own_process() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PID_FILE), format!("{}\n", std::process::id())).unwrap();
        assert!(runtime_in(dir.path()).is_running());
    }

    #[test]
    fn test_is_running_false_for_dead_process() {
        let dir = tempfile::tempdir().unwrap();
        // PID far beyond pid_max on any reasonable test machine.
        fs::write(dir.path().join(PID_FILE), "99999999\n").unwrap();
        assert!(!runtime_in(dir.path()).is_running());
    }

    #[tokio::test]
    async fn test_start_without_driver_is_missing_driver() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let result = runtime_in(dir.path()).start(&config, true).await;
        assert!(matches!(result, Err(DomainError::MissingDriver(_))));
    }

    #[tokio::test]
    async fn test_start_refuses_when_already_running() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(scripts.join(LOOP_SCRIPT), "#!/usr/bin/env bash\nexit 0\n").unwrap();
        fs::write(dir.path().join(PID_FILE), format!("{}\n", std::process::id())).unwrap();

        let config = test_config();
        let result = runtime_in(dir.path()).start(&config, true).await;
        assert!(matches!(result, Err(DomainError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn test_foreground_start_runs_driver_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(
            scripts.join(LOOP_SCRIPT),
            "#!/usr/bin/env bash\necho \"engine=$ENGINE model=$MODEL\" > \"$OUTPUT_DIR/seen-env\"\n",
        )
        .unwrap();

        let config = test_config();
        let pid = runtime_in(dir.path()).start(&config, true).await.unwrap();
        assert!(pid > 0);

        let seen = fs::read_to_string(dir.path().join("seen-env")).unwrap();
        assert_eq!(seen.trim(), "engine=claude model=opus");
    }

    #[tokio::test]
    async fn test_stop_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(
            scripts.join(STOP_SCRIPT),
            "#!/usr/bin/env bash\necho 'no loop to stop' >&2\nexit 1\n",
        )
        .unwrap();

        let result = runtime_in(dir.path()).stop(false).await;
        match result {
            Err(DomainError::StopFailed { stderr }) => assert!(stderr.contains("no loop to stop")),
            other => panic!("Expected StopFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_success_on_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("scripts");
        fs::create_dir_all(&scripts).unwrap();
        fs::write(scripts.join(STOP_SCRIPT), "#!/usr/bin/env bash\nexit 0\n").unwrap();

        assert!(runtime_in(dir.path()).stop(true).await.is_ok());
    }

    fn test_config() -> FoundryConfig {
        use crate::domain::models::CompanyConfig;
        FoundryConfig {
            company: CompanyConfig {
                name: "Test Co".to_string(),
                mission: "Test".to_string(),
                description: String::new(),
                seed_prompt: String::new(),
            },
            org: Default::default(),
            workflows: vec![],
            runtime: Default::default(),
            guardrails: Default::default(),
        }
    }
}
