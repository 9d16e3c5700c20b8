#![cfg(unix)]

use std::sync::Arc;

use procpump::cmdline::CommandVector;
use procpump::errors::ExecError;
use procpump::exec::{ExecuteRequest, LineCollector};
use procpump_test_utils::{init_tracing, isolated_executor, sh, with_timeout};

#[tokio::test(flavor = "multi_thread")]
async fn captures_stdout_and_stderr_separately_in_order() {
    init_tracing();
    let (executor, registry) = isolated_executor();

    let stdout = Arc::new(LineCollector::new());
    let stderr = Arc::new(LineCollector::new());
    let request = ExecuteRequest::new(sh(
        "for i in 1 2 3 4 5; do echo out$i; echo err$i >&2; done",
    ))
    .stdout(stdout.clone())
    .stderr(stderr.clone());

    let code = with_timeout(executor.execute(request)).await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(stdout.lines(), vec!["out1", "out2", "out3", "out4", "out5"]);
    assert_eq!(stderr.lines(), vec!["err1", "err2", "err3", "err4", "err5"]);
    assert!(registry.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn reports_nonzero_exit_code() {
    init_tracing();
    let (executor, registry) = isolated_executor();

    let code = with_timeout(executor.execute(ExecuteRequest::new(sh("exit 3"))))
        .await
        .unwrap();

    assert_eq!(code, 3);
    assert!(registry.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn signal_killed_process_reports_128_plus_signal() {
    init_tracing();
    let (executor, _registry) = isolated_executor();

    let code = with_timeout(executor.execute(ExecuteRequest::new(sh("kill -9 $$"))))
        .await
        .unwrap();

    assert_eq!(code, 128 + 9);
}

#[tokio::test(flavor = "multi_thread")]
async fn feeds_stdin_to_the_child() {
    init_tracing();
    let (executor, _registry) = isolated_executor();

    let stdout = Arc::new(LineCollector::new());
    let request = ExecuteRequest::new(CommandVector::new(["cat"]).unwrap())
        .stdin(&b"alpha\nbeta\n"[..])
        .stdout(stdout.clone());

    let code = with_timeout(executor.execute(request)).await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(stdout.lines(), vec!["alpha", "beta"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn without_input_stdin_is_empty() {
    init_tracing();
    let (executor, _registry) = isolated_executor();

    // `cat` would block forever on an inherited terminal.
    let output = with_timeout(executor.capture(CommandVector::new(["cat"]).unwrap(), None))
        .await
        .unwrap();

    assert!(output.success());
    assert!(output.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn runs_in_the_requested_working_directory() {
    init_tracing();
    let (executor, _registry) = isolated_executor();
    let dir = tempfile::tempdir().unwrap();

    let output = with_timeout(
        executor.capture(sh("pwd -P").with_working_dir(dir.path()), None),
    )
    .await
    .unwrap();

    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(output.stdout, vec![expected.to_string_lossy().into_owned()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn env_overrides_reach_the_child() {
    init_tracing();
    let (executor, _registry) = isolated_executor();

    let output = with_timeout(executor.capture(
        sh("echo \"$PROCPUMP_TEST_VALUE\"").with_env("PROCPUMP_TEST_VALUE", "from test"),
        None,
    ))
    .await
    .unwrap();

    assert_eq!(output.stdout, vec!["from test"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_env_leaves_only_overrides() {
    init_tracing();
    let (executor, _registry) = isolated_executor();

    let output = with_timeout(executor.capture(
        CommandVector::new(["/usr/bin/env"])
            .unwrap()
            .with_clear_env(true)
            .with_env("ONLY", "this"),
        None,
    ))
    .await
    .unwrap();

    assert_eq!(output.stdout, vec!["ONLY=this"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn spawn_failure_names_the_program_and_registers_nothing() {
    init_tracing();
    let (executor, registry) = isolated_executor();

    let cmd = CommandVector::new(["procpump-definitely-not-a-program"]).unwrap();
    let err = with_timeout(executor.execute(ExecuteRequest::new(cmd)))
        .await
        .unwrap_err();

    match err {
        ExecError::SpawnFailure { program, .. } => {
            assert_eq!(program, "procpump-definitely-not-a-program")
        }
        other => panic!("expected SpawnFailure, got {other:?}"),
    }
    assert!(registry.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn capture_collects_both_streams() {
    init_tracing();
    let (executor, _registry) = isolated_executor();

    let output = with_timeout(executor.capture(sh("echo hi; echo oops >&2; exit 2"), None))
        .await
        .unwrap();

    assert_eq!(output.exit_code, 2);
    assert!(!output.success());
    assert_eq!(output.stdout, vec!["hi"]);
    assert_eq!(output.stderr, vec!["oops"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn executions_run_concurrently_on_one_executor() {
    init_tracing();
    let (executor, registry) = isolated_executor();

    let runs = (0..4).map(|i| {
        let executor = executor.clone();
        async move { executor.capture(sh(&format!("sleep 0.2; echo {i}")), None).await }
    });
    let started = std::time::Instant::now();
    let outputs = with_timeout(futures_join_all(runs)).await;

    assert!(started.elapsed() < std::time::Duration::from_secs(2));
    for (i, output) in outputs.into_iter().enumerate() {
        assert_eq!(output.unwrap().stdout, vec![i.to_string()]);
    }
    assert!(registry.is_empty());
}

async fn futures_join_all<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}
