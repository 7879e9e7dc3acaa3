//! Per-source fetching: local collection files, paginated remotes, and the
//! wire schema the remote speaks.
//!
//! Ownership model:
//! - `SourceFetcher` owns one `Source` plus shared handles to the transport
//!   and the event reporter; it never holds records between fetches.
//! - `remote::fetch_all_pages` owns pagination state for a single fetch.
//! - `wire` is pure conversion with no I/O.

/// Single-source fetch with local, remote, and empty fallbacks.
pub mod fetcher;
/// Paginated remote retrieval.
pub mod remote;
/// Remote wire schema and record normalization.
pub mod wire;

pub use fetcher::{FetchOrigin, FetchOutcome, SourceFetcher};
