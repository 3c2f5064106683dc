#![cfg(unix)]

mod common;
use crate::common::{TestResult, init_tracing, sh, with_timeout};

use std::time::Duration;

use spawnkit::{AbortController, ExecError, ExecOptions, NO_ARGS, ProcessState, x};

#[tokio::test]
async fn timeout_kills_and_rejects() -> TestResult {
    init_tracing();

    let proc = x(
        "sleep",
        &["5"],
        ExecOptions::new().timeout(Duration::from_millis(100)),
    );
    let err = with_timeout(proc.wait()).await.unwrap_err();

    match &err {
        ExecError::Timeout { timeout_ms, output, .. } => {
            assert_eq!(*timeout_ms, 100);
            assert_eq!(output.signal_code.as_deref(), Some("SIGTERM"));
        }
        other => panic!("Expected Timeout, got: {:?}", other),
    }
    assert!(proc.killed());
    assert!(!proc.aborted());
    assert_eq!(proc.exit_code(), None);
    assert_eq!(proc.signal_code().as_deref(), Some("SIGTERM"));
    assert_eq!(proc.state(), ProcessState::TimedOut);
    Ok(())
}

#[tokio::test]
async fn timeout_is_inert_after_natural_exit() -> TestResult {
    init_tracing();

    let proc = x("true", NO_ARGS, ExecOptions::new().timeout(Duration::from_secs(5)));
    let result = with_timeout(proc.wait()).await?;

    assert_eq!(result.exit_code, Some(0));
    assert!(!proc.killed());
    assert_eq!(proc.state(), ProcessState::Succeeded);
    Ok(())
}

#[tokio::test]
async fn kill_terminates_running_process() -> TestResult {
    init_tracing();

    let proc = x("sleep", &["5"], ExecOptions::default());
    assert!(proc.kill());
    assert!(proc.killed());

    let result = with_timeout(proc.wait()).await?;
    assert_eq!(result.exit_code, None);
    assert_eq!(result.signal_code.as_deref(), Some("SIGTERM"));
    assert!(!proc.aborted());
    assert_eq!(proc.state(), ProcessState::FailedExit);
    Ok(())
}

#[tokio::test]
async fn kill_is_idempotent() -> TestResult {
    init_tracing();

    let proc = x("sleep", &["5"], ExecOptions::default());
    proc.kill();
    proc.kill();
    with_timeout(proc.wait()).await?;

    assert!(proc.killed());
    assert!(!proc.kill());
    assert!(proc.killed());
    Ok(())
}

#[tokio::test]
async fn kill_with_throw_on_error_rejects() -> TestResult {
    init_tracing();

    let proc = x("sleep", &["5"], ExecOptions::new().throw_on_error(true));
    proc.kill();

    let err = with_timeout(proc.wait()).await.unwrap_err();
    assert!(matches!(err, ExecError::NonZeroExit { .. }));
    assert!(err.to_string().contains("SIGTERM"));
    Ok(())
}

#[tokio::test]
async fn abort_resolves_with_empty_output() -> TestResult {
    init_tracing();

    let controller = AbortController::new();
    let proc = x("sleep", &["4"], ExecOptions::new().signal(controller.signal()));
    controller.abort();

    let result = with_timeout(proc.wait()).await?;
    assert_eq!(result.stdout, "");
    assert_eq!(result.stderr, "");
    assert!(proc.aborted());
    assert!(proc.killed());
    assert_eq!(proc.state(), ProcessState::Aborted);
    Ok(())
}

#[tokio::test]
async fn abort_keeps_partial_output() -> TestResult {
    init_tracing();

    let controller = AbortController::new();
    let proc = sh(
        "echo started; exec sleep 5",
        ExecOptions::new().signal(controller.signal()),
    );
    let mut lines = proc.lines();
    assert_eq!(with_timeout(lines.next_line()).await?, Some("started".to_string()));

    controller.abort();
    assert_eq!(with_timeout(lines.next_line()).await?, None);

    let result = proc.wait().await?;
    assert_eq!(result.stdout, "started\n");
    assert!(proc.aborted());
    Ok(())
}

#[tokio::test]
async fn abort_before_spawn_kills_immediately() -> TestResult {
    init_tracing();

    let controller = AbortController::new();
    controller.abort();

    let proc = x("sleep", &["5"], ExecOptions::new().signal(controller.signal()));
    with_timeout(proc.wait()).await?;
    assert!(proc.aborted());
    assert!(proc.killed());
    Ok(())
}

#[tokio::test]
async fn every_waiter_sees_the_same_outcome() -> TestResult {
    init_tracing();

    let proc = sh("echo shared; exit 4", ExecOptions::new().throw_on_error(true));
    let (first, second) = with_timeout(async { tokio::join!(proc.wait(), proc.wait()) }).await;

    assert_eq!(first.unwrap_err().exit_code(), Some(4));
    assert_eq!(second.unwrap_err().exit_code(), Some(4));
    assert_eq!(proc.wait().await.unwrap_err().exit_code(), Some(4));
    Ok(())
}

#[tokio::test]
async fn kill_after_exit_is_refused_while_output_drains() -> TestResult {
    init_tracing();

    // The background `sleep` keeps stdout open after `sh` itself has exited.
    let proc = sh("sleep 1 & echo hi", ExecOptions::default());
    with_timeout(async {
        while proc.exit_code().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(!proc.kill());
    assert!(!proc.killed());

    let result = with_timeout(proc.wait()).await?;
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.stdout, "hi\n");
    assert!(!proc.killed());
    assert_eq!(proc.state(), ProcessState::Succeeded);
    Ok(())
}
