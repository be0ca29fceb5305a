//! Lifecycle integration: generated driver artifacts and the loop
//! runtime's stateless rediscovery of process state.

use std::fs;

use foundry::domain::models::{CycleStatus, FoundryConfig, LoopStatus};
use foundry::infrastructure::generator;
use foundry::{DomainError, LoopRuntime};

fn sample_config() -> FoundryConfig {
    serde_yaml::from_str(
        r"
company:
  name: Lifecycle Co
  mission: Start and stop cleanly
org:
  agents:
    - role: ceo
      persona:
        id: jeff-bezos
      model: opus
      layer: strategy
",
    )
    .unwrap()
}

#[tokio::test]
async fn start_without_generated_artifacts_reports_missing_driver() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = LoopRuntime::new(dir.path());

    let result = runtime.start(&sample_config(), true).await;
    match result {
        Err(DomainError::MissingDriver(path)) => {
            assert!(path.ends_with("scripts/auto-loop.sh"));
        }
        other => panic!("Expected MissingDriver, got {other:?}"),
    }
}

#[tokio::test]
async fn generated_stop_script_reports_nothing_to_stop() {
    let dir = tempfile::tempdir().unwrap();
    generator::generate_all(&sample_config(), dir.path()).unwrap();

    let runtime = LoopRuntime::new(dir.path());
    let result = runtime.stop(false).await;
    match result {
        Err(DomainError::StopFailed { stderr }) => assert!(stderr.contains("No PID file")),
        other => panic!("Expected StopFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn generated_stop_script_clears_a_stale_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    generator::generate_all(&sample_config(), dir.path()).unwrap();

    // A PID that cannot belong to a live process.
    fs::write(dir.path().join(".auto-loop.pid"), "99999999\n").unwrap();

    let runtime = LoopRuntime::new(dir.path());
    assert!(!runtime.is_running(), "stale PID must not read as running");

    runtime.stop(false).await.unwrap();
    assert!(!dir.path().join(".auto-loop.pid").exists());
}

#[test]
fn state_written_by_an_interrupted_loop_is_rediscovered() {
    let dir = tempfile::tempdir().unwrap();

    // Simulate the driver's on-disk footprint after a circuit break.
    fs::write(
        dir.path().join(".auto-loop-state"),
        "cycle_count=9\nerror_count=5\nstatus=circuit_break\nmodel=sonnet\nengine=claude\nlast_run=2026-08-06T09:00:00+00:00\n",
    )
    .unwrap();
    let logs = dir.path().join("logs");
    fs::create_dir_all(&logs).unwrap();
    fs::write(
        logs.join("cycle-9.log"),
        "cycle: 9\nstatus: timeout\ncost:\ntimestamp: 2026-08-06T09:00:00+00:00\n---\nCycle exceeded 1800s",
    )
    .unwrap();

    // A fresh supervisor (as after a tool restart) sees everything.
    let runtime = LoopRuntime::new(dir.path());
    let status = runtime.status().unwrap();
    assert_eq!(status.status, LoopStatus::CircuitBreak);
    assert_eq!(status.loop_count, 9);
    assert_eq!(status.error_count, 5);

    let latest = runtime.latest_cycle().unwrap();
    assert_eq!(latest.status, CycleStatus::Timeout);
    assert_eq!(latest.cost_usd, None, "blank cost stays absent in raw results");

    assert!(!runtime.is_running());
}

#[tokio::test]
async fn foreground_driver_receives_the_runtime_environment() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    fs::create_dir_all(&scripts).unwrap();
    fs::write(
        scripts.join("auto-loop.sh"),
        "#!/usr/bin/env bash\nprintenv LOOP_INTERVAL CYCLE_TIMEOUT_SECONDS MAX_CONSECUTIVE_ERRORS > \"$OUTPUT_DIR/env-dump\"\n",
    )
    .unwrap();

    let runtime = LoopRuntime::new(dir.path());
    runtime.start(&sample_config(), true).await.unwrap();

    let dump = fs::read_to_string(dir.path().join("env-dump")).unwrap();
    let values: Vec<&str> = dump.lines().collect();
    assert_eq!(values, vec!["30", "1800", "5"]);
}
