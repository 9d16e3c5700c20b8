use std::time::Duration;

use procpump::exec::ProcessRegistry;
use procpump_test_utils::{init_tracing, with_timeout};

#[test]
fn add_and_remove_track_membership() {
    init_tracing();

    let registry = ProcessRegistry::new();
    assert!(registry.is_empty());

    let first = registry.add(Some(100), "sleep");
    let second = registry.add(Some(101), "cat");
    assert_eq!(registry.len(), 2);
    assert!(registry.contains(first.id()));
    assert_ne!(first.id(), second.id());

    let listed = registry.processes();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].program, "sleep");
    assert_eq!(listed[0].pid, Some(100));
    assert_eq!(listed[1].program, "cat");

    assert!(registry.remove(first.id()));
    assert!(!registry.remove(first.id()));
    assert!(!registry.contains(first.id()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn dropping_a_registration_deregisters_it() {
    init_tracing();

    let registry = ProcessRegistry::new();
    let registration = registry.add(None, "true");
    let id = registration.id();
    assert!(registry.contains(id));

    drop(registration);
    assert!(!registry.contains(id));
    assert!(registry.is_empty());
}

#[test]
fn clones_share_the_same_set() {
    let registry = ProcessRegistry::new();
    let other = registry.clone();

    let _registration = registry.add(Some(1), "x");
    assert_eq!(other.len(), 1);
}

#[tokio::test]
async fn kill_all_signals_every_registration_once() {
    init_tracing();

    let registry = ProcessRegistry::new();
    let mut a = registry.add(Some(1), "a");
    let mut b = registry.add(Some(2), "b");

    assert!(!registry.is_shutting_down());
    assert_eq!(registry.kill_all(), 2);
    assert!(registry.is_shutting_down());

    with_timeout(a.kill_requested()).await;
    with_timeout(b.kill_requested()).await;

    // Already signalled.
    assert_eq!(registry.kill_all(), 0);
    // Entries stay until their executions drop them.
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn kill_request_does_not_fire_without_kill_all() {
    init_tracing();

    let registry = ProcessRegistry::new();
    let mut registration = registry.add(Some(1), "a");

    let fired = tokio::time::timeout(Duration::from_millis(50), registration.kill_requested()).await;
    assert!(fired.is_err());
}

#[tokio::test]
async fn registration_after_shutdown_is_born_killed() {
    init_tracing();

    let registry = ProcessRegistry::new();
    registry.kill_all();

    let mut late = registry.add(Some(7), "late");
    with_timeout(late.kill_requested()).await;
}

#[tokio::test]
async fn shutdown_waits_for_registrations_to_drop() {
    init_tracing();

    let registry = ProcessRegistry::new();
    let mut registration = registry.add(Some(1), "worker");

    // Plays the executor: reap on kill request, then deregister.
    let worker = tokio::spawn(async move {
        registration.kill_requested().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(registration);
    });

    let signalled = with_timeout(registry.shutdown(Duration::from_secs(5))).await;
    assert_eq!(signalled, 1);
    assert!(registry.is_empty());
    worker.await.unwrap();
}

#[tokio::test]
async fn shutdown_gives_up_after_grace() {
    init_tracing();

    let registry = ProcessRegistry::new();
    let _stuck = registry.add(Some(1), "stuck");

    let started = std::time::Instant::now();
    registry.shutdown(Duration::from_millis(50)).await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(registry.len(), 1);
}

#[test]
fn shutdown_guard_kills_on_drop() {
    let registry = ProcessRegistry::new();
    let _registration = registry.add(Some(1), "a");

    {
        let _guard = registry.shutdown_guard();
    }
    assert!(registry.is_shutting_down());
}
