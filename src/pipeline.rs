//! Fetch-cycle orchestration.
//!
//! Ownership model:
//! - `CatalogPipeline` owns the `FetchLock`, the sender half of the delivery
//!   channel, and shared handles to config, transport, and reporter.
//! - Each cycle runs on its own thread and owns the `FetchGuard`; the lock is
//!   released when the cycle thread finishes, including by panic.
//! - Fetchers run on scoped threads so they may borrow cycle state; cache
//!   writes are detached and outlive the cycle.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, sync_channel};
use std::thread;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::config::{CatalogConfig, Source};
use crate::constants::pipeline::{DELIVERY_POLL_INTERVAL, STATUS_DONE, STATUS_LOADING};
use crate::data::RecordCollection;
use crate::event::{EventReporter, Severity};
use crate::merge::merge_by_precedence;
use crate::source::{FetchOrigin, FetchOutcome, SourceFetcher};
use crate::transport::fs::ready_dir;
use crate::transport::http::HttpTransport;

/// Whether a fetch cycle is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
}

/// Single-flight flag shared between the pipeline and its running cycle.
#[derive(Clone, Debug, Default)]
pub struct FetchLock {
    busy: Arc<AtomicBool>,
}

impl FetchLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock if no cycle holds it.
    pub fn try_acquire(&self) -> Option<FetchGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FetchGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn state(&self) -> FetchState {
        if self.busy.load(Ordering::Acquire) {
            FetchState::Fetching
        } else {
            FetchState::Idle
        }
    }
}

/// Releases the `FetchLock` on drop.
#[derive(Debug)]
pub struct FetchGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Merged collection delivered to the consumer at the end of a cycle.
#[derive(Clone, Debug)]
pub struct CatalogSnapshot {
    /// Merged records, ascending by key.
    pub records: RecordCollection,
    /// When the cycle finished merging.
    pub fetched_at: DateTime<Utc>,
    /// Whether the cycle bypassed local files.
    pub force: bool,
}

struct CycleContext {
    config: CatalogConfig,
    reporter: Arc<EventReporter>,
    transport: Arc<dyn HttpTransport>,
    delivery: SyncSender<CatalogSnapshot>,
}

/// Runs at most one fetch-merge-deliver cycle at a time.
pub struct CatalogPipeline {
    context: Arc<CycleContext>,
    lock: FetchLock,
}

impl CatalogPipeline {
    /// Create a pipeline and the receiver its snapshots are delivered on.
    ///
    /// Delivery is a rendezvous: a cycle stays in flight until its snapshot is
    /// received or the receiver is dropped.
    pub fn new(
        config: CatalogConfig,
        reporter: Arc<EventReporter>,
        transport: Arc<dyn HttpTransport>,
    ) -> (Self, Receiver<CatalogSnapshot>) {
        let (delivery, receiver) = sync_channel(0);
        let pipeline = Self {
            context: Arc::new(CycleContext {
                config,
                reporter,
                transport,
                delivery,
            }),
            lock: FetchLock::new(),
        };
        (pipeline, receiver)
    }

    /// Start a cycle on a new thread unless one is already running.
    ///
    /// Returns `false` (and does nothing) when a cycle is in flight.
    pub fn request_fetch(&self, force: bool) -> bool {
        let Some(guard) = self.lock.try_acquire() else {
            debug!(force, "fetch already in flight; request dropped");
            return false;
        };
        let context = Arc::clone(&self.context);
        thread::spawn(move || {
            let _guard = guard;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| context.run_cycle(force)));
            if let Err(payload) = outcome {
                let reason = panic_reason(payload.as_ref());
                error!(reason = %reason, "fetch cycle panicked");
                context.reporter.register(
                    Severity::Error,
                    &format!("Fetch cycle aborted: {reason}"),
                    "",
                );
            }
        });
        true
    }

    pub fn state(&self) -> FetchState {
        self.lock.state()
    }

    /// Block until the in-flight cycle delivers its snapshot.
    ///
    /// Returns `None` once no cycle is in flight and nothing was delivered,
    /// which happens when a cycle aborted or none was requested.
    pub fn wait_for_snapshot(
        &self,
        snapshots: &Receiver<CatalogSnapshot>,
    ) -> Option<CatalogSnapshot> {
        loop {
            match snapshots.recv_timeout(DELIVERY_POLL_INTERVAL) {
                Ok(snapshot) => return Some(snapshot),
                Err(RecvTimeoutError::Timeout) if self.state() == FetchState::Fetching => {}
                Err(_) => return None,
            }
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.context.config
    }

    pub fn reporter(&self) -> &Arc<EventReporter> {
        &self.context.reporter
    }
}

impl CycleContext {
    fn run_cycle(&self, force: bool) {
        self.reporter
            .register(Severity::Info, "Started loading spells...", STATUS_LOADING);

        for dir in [self.config.cache_dir(), self.config.local_dir()] {
            if let Err(err) = ready_dir(&dir) {
                self.reporter.register(
                    Severity::Error,
                    &format!("Could not create directory {}: {err}", dir.display()),
                    "",
                );
            }
        }

        let outcomes = self.fetch_sources(self.config.sources(), force);

        self.reporter
            .register(Severity::Info, "Merging spells...", "Merging spells...");
        // dropping the outcomes' cache handles detaches any pending cache writes
        let records = merge_by_precedence(outcomes.into_iter().map(|outcome| outcome.records));
        let total = records.len();
        let snapshot = CatalogSnapshot {
            records,
            fetched_at: Utc::now(),
            force,
        };

        match self.delivery.send(snapshot) {
            Ok(()) => self.reporter.register(
                Severity::Info,
                &format!("Loaded spells successfully ({total} records)"),
                STATUS_DONE,
            ),
            Err(_) => self.reporter.register(
                Severity::Warn,
                &format!("Catalog consumer is gone; discarded {total} records"),
                "",
            ),
        }
    }

    /// Fetch every source concurrently and wait for all of them.
    fn fetch_sources(&self, sources: Vec<Source>, force: bool) -> Vec<FetchOutcome> {
        thread::scope(|scope| {
            let handles: Vec<_> = sources
                .into_iter()
                .map(|source| {
                    let name = source.name().to_string();
                    let fetcher = SourceFetcher::new(
                        source,
                        Arc::clone(&self.transport),
                        Arc::clone(&self.reporter),
                    );
                    (name, scope.spawn(move || fetcher.fetch(force)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| match handle.join() {
                    Ok(outcome) => {
                        debug!(
                            source = %outcome.source_name,
                            origin = ?outcome.origin,
                            records = outcome.records.len(),
                            "source fetch completed"
                        );
                        outcome
                    }
                    Err(payload) => {
                        self.reporter.register(
                            Severity::Error,
                            &format!(
                                "Fetcher for {name} panicked: {}",
                                panic_reason(payload.as_ref())
                            ),
                            &format!("Could not load {name}"),
                        );
                        FetchOutcome {
                            source_name: name,
                            records: Vec::new(),
                            origin: FetchOrigin::Empty,
                            cache_write: None,
                        }
                    }
                })
                .collect()
        })
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
