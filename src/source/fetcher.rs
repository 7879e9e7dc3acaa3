use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::cache::spawn_cache_write;
use crate::config::Source;
use crate::data::{Record, RecordCollection, sort_by_key};
use crate::errors::CatalogError;
use crate::event::{EventReporter, Severity};
use crate::source::remote::fetch_all_pages;
use crate::transport::fs::{file_exists, load_json};
use crate::transport::http::HttpTransport;
use crate::types::SourceName;

/// Where a fetched collection came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOrigin {
    /// Parsed from the source's local file.
    Local,
    /// Paged from the remote endpoint (possibly partial).
    Remote,
    /// Neither a usable local file nor a remote endpoint.
    Empty,
}

/// Result of fetching one source.
#[derive(Debug)]
pub struct FetchOutcome {
    pub source_name: SourceName,
    /// Records sorted ascending by key.
    pub records: RecordCollection,
    pub origin: FetchOrigin,
    /// Detached cache write spawned after a complete remote fetch.
    ///
    /// Dropping the handle detaches the write; joining it waits for the file.
    pub cache_write: Option<JoinHandle<()>>,
}

/// Fetches the full collection of a single source.
pub struct SourceFetcher {
    source: Source,
    transport: Arc<dyn HttpTransport>,
    reporter: Arc<EventReporter>,
}

impl SourceFetcher {
    pub fn new(
        source: Source,
        transport: Arc<dyn HttpTransport>,
        reporter: Arc<EventReporter>,
    ) -> Self {
        Self {
            source,
            transport,
            reporter,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Produce this source's collection.
    ///
    /// A present local file wins unless `force` is set; otherwise the remote
    /// endpoint is paged; otherwise the result is empty. Failures are reported
    /// as events and degrade to an empty or partial collection.
    pub fn fetch(&self, force: bool) -> FetchOutcome {
        let name = self.source.name();
        let local_present = self.source.local_path().is_some_and(file_exists);

        if !force
            && local_present
            && let Some(path) = self.source.local_path()
        {
            return self.fetch_local(path);
        }
        if let Some(endpoint) = self.source.remote_endpoint() {
            let status = if local_present {
                format!("Refetching {name} from remote API...")
            } else {
                format!("Could not find {name} locally, fetching from remote API...")
            };
            self.reporter.register(Severity::Info, &status, &status);
            return self.fetch_remote(endpoint);
        }

        self.reporter.register(
            Severity::Info,
            &format!("No data available for {name}"),
            "",
        );
        self.outcome(Vec::new(), FetchOrigin::Empty, None)
    }

    /// Parse the local file as a canonical collection.
    pub fn load_local(&self, path: &Path) -> Result<RecordCollection, CatalogError> {
        load_json(path).map_err(|err| CatalogError::Parse {
            source_name: self.source.name().to_string(),
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    fn fetch_local(&self, path: &Path) -> FetchOutcome {
        let name = self.source.name();
        match self.load_local(path) {
            Ok(records) => {
                let records = self.drop_keyless(records, "local file");
                self.reporter.register(
                    Severity::Info,
                    &format!(
                        "Loaded {} records for {name} from {}",
                        records.len(),
                        path.display()
                    ),
                    &format!("Loaded offline cache for {name}"),
                );
                self.outcome(records, FetchOrigin::Local, None)
            }
            Err(err) => {
                self.reporter.register(
                    Severity::Error,
                    &err.to_string(),
                    &format!("Could not parse {name} from local file"),
                );
                self.outcome(Vec::new(), FetchOrigin::Local, None)
            }
        }
    }

    fn fetch_remote(&self, endpoint: &str) -> FetchOutcome {
        let name = self.source.name();
        let pages = fetch_all_pages(self.transport.as_ref(), name, endpoint);
        let complete = pages.is_complete();

        match &pages.error {
            Some(err) => {
                warn!(source = name, pages = pages.pages, "remote pagination stopped early");
                self.reporter.register(
                    Severity::Error,
                    &err.to_string(),
                    &format!("Could not fetch {name} from remote API"),
                );
            }
            None => {
                if let Some(count) = pages.reported_count
                    && count != pages.records.len() as u64
                {
                    debug!(
                        source = name,
                        reported = count,
                        received = pages.records.len(),
                        "remote record count differs from reported count"
                    );
                }
                self.reporter.register(
                    Severity::Info,
                    &format!(
                        "Fetched {} records for {name} across {} pages",
                        pages.records.len(),
                        pages.pages
                    ),
                    &format!("Fetched online spells for {name}"),
                );
            }
        }

        let mut records = self.drop_keyless(pages.records, "remote API");
        sort_by_key(&mut records);

        let cache_write = match self.source.local_path() {
            Some(path) if complete => {
                self.reporter
                    .register(Severity::Info, "", &format!("Caching {name}..."));
                Some(spawn_cache_write(
                    name.to_string(),
                    path.to_path_buf(),
                    records.clone(),
                    Arc::clone(&self.reporter),
                ))
            }
            _ => None,
        };
        self.outcome(records, FetchOrigin::Remote, cache_write)
    }

    /// Remove records with a blank key, reporting how many were dropped.
    fn drop_keyless(&self, mut records: RecordCollection, origin: &str) -> RecordCollection {
        let before = records.len();
        records.retain(Record::has_key);
        let dropped = before - records.len();
        if dropped > 0 {
            self.reporter.register(
                Severity::Warn,
                &format!(
                    "Dropped {dropped} of {before} records without a key from {} ({origin})",
                    self.source.name()
                ),
                "",
            );
        }
        records
    }

    fn outcome(
        &self,
        mut records: RecordCollection,
        origin: FetchOrigin,
        cache_write: Option<JoinHandle<()>>,
    ) -> FetchOutcome {
        sort_by_key(&mut records);
        FetchOutcome {
            source_name: self.source.name().to_string(),
            records,
            origin,
            cache_write,
        }
    }
}
