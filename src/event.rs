//! Event reporting: one call both logs an event and forwards its status text.
//!
//! Ownership model:
//! - `EventReporter` owns the durable `EventLog` behind a mutex, so log lines
//!   stay in call order under concurrent callers.
//! - Status text goes to a `StatusSubscriber`; the default `NoopSubscriber`
//!   drops it, so call sites never special-case a missing listener.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use tracing::{error, info, warn};

use crate::log::EventLog;
use crate::types::{LogMessage, StatusText};

/// Event severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Bracketed tag used in log lines.
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An immutable, fire-and-forget event.
///
/// Empty `log_text` skips the log write; empty `status_text` skips the status forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub log_text: LogMessage,
    pub status_text: StatusText,
}

impl Event {
    pub fn new(
        severity: Severity,
        log_text: impl Into<LogMessage>,
        status_text: impl Into<StatusText>,
    ) -> Self {
        Self {
            severity,
            log_text: log_text.into(),
            status_text: status_text.into(),
        }
    }

    pub fn info(log_text: impl Into<LogMessage>, status_text: impl Into<StatusText>) -> Self {
        Self::new(Severity::Info, log_text, status_text)
    }

    pub fn warn(log_text: impl Into<LogMessage>, status_text: impl Into<StatusText>) -> Self {
        Self::new(Severity::Warn, log_text, status_text)
    }

    pub fn error(log_text: impl Into<LogMessage>, status_text: impl Into<StatusText>) -> Self {
        Self::new(Severity::Error, log_text, status_text)
    }
}

/// Receiver of live status text.
///
/// Implementations must not block the caller.
pub trait StatusSubscriber: Send + Sync {
    fn notify(&self, status: &str);
}

/// Subscriber that drops every status.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSubscriber;

impl StatusSubscriber for NoopSubscriber {
    fn notify(&self, _status: &str) {}
}

/// Forwards status text over an unbounded channel.
///
/// Sends never block; once the receiver is gone, statuses are dropped.
pub struct ChannelSubscriber {
    sender: mpsc::Sender<StatusText>,
}

impl ChannelSubscriber {
    pub fn new(sender: mpsc::Sender<StatusText>) -> Self {
        Self { sender }
    }

    /// Create a subscriber plus the receiving end for the presentation layer.
    pub fn channel() -> (Self, mpsc::Receiver<StatusText>) {
        let (sender, receiver) = mpsc::channel();
        (Self::new(sender), receiver)
    }
}

impl StatusSubscriber for ChannelSubscriber {
    fn notify(&self, status: &str) {
        let _ = self.sender.send(status.to_string());
    }
}

impl<F> StatusSubscriber for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, status: &str) {
        self(status)
    }
}

/// Per-severity counts of registered events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

#[derive(Default)]
struct EventStats {
    info: AtomicUsize,
    warn: AtomicUsize,
    error: AtomicUsize,
}

/// Serialized sink for `(severity, log text, status text)` events.
pub struct EventReporter {
    log: Mutex<EventLog>,
    subscriber: Box<dyn StatusSubscriber>,
    stats: EventStats,
}

impl EventReporter {
    /// Reporter that logs to `log` and drops status text.
    pub fn new(log: EventLog) -> Self {
        Self::with_subscriber(log, NoopSubscriber)
    }

    /// Reporter that logs to `log` and forwards status text to `subscriber`.
    pub fn with_subscriber(log: EventLog, subscriber: impl StatusSubscriber + 'static) -> Self {
        Self {
            log: Mutex::new(log),
            subscriber: Box::new(subscriber),
            stats: EventStats::default(),
        }
    }

    /// Reporter with a discarding log and no subscriber.
    pub fn silent() -> Self {
        Self::new(EventLog::discard())
    }

    /// Log `log_text` (if non-empty) and forward `status_text` (if non-empty).
    pub fn register(&self, severity: Severity, log_text: &str, status_text: &str) {
        let counter = match severity {
            Severity::Info => &self.stats.info,
            Severity::Warn => &self.stats.warn,
            Severity::Error => &self.stats.error,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if !log_text.is_empty() {
            match severity {
                Severity::Info => info!(target: "litch::event", "{log_text}"),
                Severity::Warn => warn!(target: "litch::event", "{log_text}"),
                Severity::Error => error!(target: "litch::event", "{log_text}"),
            }
            let mut log = self
                .log
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Err(err) = log.append(severity, log_text) {
                warn!(error = %err, "event log write failed");
            }
        }
        if !status_text.is_empty() {
            self.subscriber.notify(status_text);
        }
    }

    /// Register a prebuilt event.
    pub fn emit(&self, event: &Event) {
        self.register(event.severity, &event.log_text, &event.status_text);
    }

    /// Counts of events registered so far, by severity.
    pub fn counts(&self) -> EventCounts {
        EventCounts {
            info: self.stats.info.load(Ordering::Relaxed),
            warn: self.stats.warn.load(Ordering::Relaxed),
            error: self.stats.error.load(Ordering::Relaxed),
        }
    }

    /// Flush buffered log output.
    pub fn flush(&self) {
        let mut log = self
            .log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = log.flush() {
            warn!(error = %err, "event log flush failed");
        }
    }
}
