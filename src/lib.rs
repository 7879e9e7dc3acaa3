#![doc = include_str!("../README.md")]

/// CLI front end shared by the `litch` binary.
pub mod app;
/// Best-effort cache writes for fetched remote collections.
pub mod cache;
/// Catalog configuration and source definitions.
pub mod config;
/// Centralized constants for paths, remote wire values, and status text.
pub mod constants;
/// Canonical record types and ordering helpers.
pub mod data;
/// Event reporting and status subscribers.
pub mod event;
/// Durable event log.
pub mod log;
/// Precedence-aware merge of sorted collections.
pub mod merge;
/// Single-flight fetch cycle orchestration.
pub mod pipeline;
/// Headless browsing state fed by the pipeline.
pub mod session;
/// Per-source fetching and remote wire handling.
pub mod source;
/// Filesystem and HTTP transports used by sources.
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{CatalogConfig, Source};
pub use data::{Named, Record, RecordCollection};
pub use errors::CatalogError;
pub use event::{
    ChannelSubscriber, Event, EventCounts, EventReporter, NoopSubscriber, Severity,
    StatusSubscriber,
};
pub use log::EventLog;
pub use merge::{merge_by_precedence, merge_collections};
pub use pipeline::{CatalogPipeline, CatalogSnapshot, FetchGuard, FetchLock, FetchState};
pub use session::{BrowserSession, InputMode};
pub use source::{FetchOrigin, FetchOutcome, SourceFetcher};
pub use transport::http::{HttpTransport, TransportFailure, UreqTransport};
pub use types::{EndpointUrl, LogMessage, RecordKey, SourceName, StatusText};
