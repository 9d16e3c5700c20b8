// src/exec/registry.rs

//! Set of processes currently being executed, used to make sure none of them
//! outlives the program.
//!
//! The registry does not own the processes. Each execution registers itself
//! and receives a [`Registration`] carrying a kill switch; the executor races
//! that switch against the process exit and kills the child when it fires.
//! [`ProcessRegistry::kill_all`] flips every switch. Children are also spawned
//! with `kill_on_drop`, so executions torn down with the runtime still take
//! their process with them.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Registry-local identifier of one execution. Unlike an OS pid it is never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of one registered process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredProcess {
    pub id: ProcessId,
    pub pid: Option<u32>,
    pub program: String,
}

#[derive(Debug)]
struct Entry {
    pid: Option<u32>,
    program: String,
    kill: watch::Sender<bool>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<ProcessId, Entry>>,
    next_id: AtomicU64,
    shutting_down: AtomicBool,
    emptied: Notify,
}

/// Cheap to clone; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct ProcessRegistry {
    inner: Arc<Inner>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ProcessId, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a freshly spawned process.
    ///
    /// If shutdown has already begun, the returned registration is born with
    /// its kill switch on.
    pub fn add(&self, pid: Option<u32>, program: impl Into<String>) -> Registration {
        let id = ProcessId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (kill, kill_rx) = watch::channel(self.is_shutting_down());
        let program = program.into();

        debug!(%id, pid, program = %program, "registering process");
        self.entries().insert(id, Entry { pid, program, kill });

        Registration {
            id,
            kill_rx,
            registry: self.clone(),
        }
    }

    /// Remove a process. Returns false if it was not registered.
    pub fn remove(&self, id: ProcessId) -> bool {
        let (removed, now_empty) = {
            let mut entries = self.entries();
            let removed = entries.remove(&id).is_some();
            (removed, entries.is_empty())
        };
        if removed {
            debug!(%id, "deregistered process");
            if now_empty {
                self.inner.emptied.notify_waiters();
            }
        }
        removed
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.entries().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Snapshot of everything currently registered, ordered by registration.
    pub fn processes(&self) -> Vec<RegisteredProcess> {
        let mut list: Vec<RegisteredProcess> = self
            .entries()
            .iter()
            .map(|(id, e)| RegisteredProcess {
                id: *id,
                pid: e.pid,
                program: e.program.clone(),
            })
            .collect();
        list.sort_by_key(|p| p.id);
        list
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// Enter shutdown and ask every registered execution to kill its process.
    ///
    /// Returns how many processes were signalled by this call. Entries stay
    /// registered until their executor has reaped the child.
    pub fn kill_all(&self) -> usize {
        self.inner.shutting_down.store(true, Ordering::SeqCst);

        let entries = self.entries();
        let mut signalled = 0;
        for (id, entry) in entries.iter() {
            if !*entry.kill.borrow() {
                debug!(%id, pid = entry.pid, program = %entry.program, "destroying process");
                entry.kill.send_replace(true);
                signalled += 1;
            }
        }
        drop(entries);

        if signalled > 0 {
            warn!(count = signalled, "destroying {} registered process(es)", signalled);
        }
        signalled
    }

    /// [`kill_all`](Self::kill_all), then wait up to `grace` for the killed
    /// processes to be deregistered.
    ///
    /// Returns the number of processes signalled.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let signalled = self.kill_all();

        let drained = tokio::time::timeout(grace, async {
            loop {
                let emptied = self.inner.emptied.notified();
                if self.is_empty() {
                    return;
                }
                emptied.await;
            }
        })
        .await;

        match drained {
            Ok(()) if signalled > 0 => info!(count = signalled, "destroyed {} process(es)", signalled),
            Ok(()) => {}
            Err(_) => warn!(
                remaining = self.len(),
                "processes still registered after shutdown grace period"
            ),
        }
        signalled
    }

    /// Listen for Ctrl-C and run [`shutdown`](Self::shutdown) when it
    /// arrives. Install once, at program start.
    pub fn spawn_ctrl_c_listener(&self, grace: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; shutting down registered processes");
            registry.shutdown(grace).await;
        })
    }

    /// Guard that calls [`kill_all`](Self::kill_all) when dropped.
    pub fn shutdown_guard(&self) -> ShutdownGuard {
        ShutdownGuard {
            registry: self.clone(),
        }
    }
}

/// Proof of registration held by one execution.
///
/// Dropping it removes the entry, so an execution abandoned halfway (e.g. its
/// future was dropped) never leaves a stale entry behind.
#[derive(Debug)]
pub struct Registration {
    id: ProcessId,
    kill_rx: watch::Receiver<bool>,
    registry: ProcessRegistry,
}

impl Registration {
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Resolves once the registry asks for this process to be killed.
    pub async fn kill_requested(&mut self) {
        if self.kill_rx.wait_for(|kill| *kill).await.is_err() {
            // Entry removed without a kill request; never fires.
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

/// Kills every registered process when dropped.
#[derive(Debug)]
pub struct ShutdownGuard {
    registry: ProcessRegistry,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        let killed = self.registry.kill_all();
        if killed > 0 {
            info!(count = killed, "shutdown guard destroyed remaining processes");
        }
    }
}
