use std::collections::HashSet;

use tracing::debug;
use url::Url;

use crate::data::RecordCollection;
use crate::errors::CatalogError;
use crate::source::wire::{WirePage, normalize_page};
use crate::transport::http::HttpTransport;
use crate::types::EndpointUrl;

/// Records accumulated from a paginated remote, plus the failure that stopped it early.
#[derive(Debug, Default)]
pub struct RemotePages {
    /// Normalized records from every page that was fetched and decoded.
    pub records: RecordCollection,
    /// Number of pages successfully decoded.
    pub pages: usize,
    /// `count` reported by the last decoded page.
    pub reported_count: Option<u64>,
    /// Set when pagination stopped before the last page.
    pub error: Option<CatalogError>,
}

impl RemotePages {
    /// True when every page up to the last one was fetched.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Follow `next` links from `endpoint` until a page reports none.
///
/// Never fails as a whole: a transport or decode error stops pagination and is
/// returned alongside whatever was accumulated before it.
pub fn fetch_all_pages(
    transport: &dyn HttpTransport,
    source_name: &str,
    endpoint: &str,
) -> RemotePages {
    let mut result = RemotePages::default();
    let mut visited: HashSet<EndpointUrl> = HashSet::new();
    let mut url = endpoint.to_string();

    loop {
        if !visited.insert(url.clone()) {
            result.error = Some(CatalogError::Transport {
                source_name: source_name.to_string(),
                url,
                reason: "next link points at an already fetched page".into(),
            });
            break;
        }

        let body = match transport.get(&url) {
            Ok(body) => body,
            Err(err) => {
                result.error = Some(CatalogError::Transport {
                    source_name: source_name.to_string(),
                    url,
                    reason: err.to_string(),
                });
                break;
            }
        };
        let page: WirePage = match serde_json::from_str(&body) {
            Ok(page) => page,
            Err(err) => {
                result.error = Some(CatalogError::Decode {
                    source_name: source_name.to_string(),
                    url,
                    reason: err.to_string(),
                });
                break;
            }
        };

        result.pages += 1;
        result.reported_count = Some(page.count);
        result.records.extend(normalize_page(&page.results));
        debug!(
            source = source_name,
            page = result.pages,
            accumulated = result.records.len(),
            "decoded remote page"
        );

        match page.next_link() {
            Some(next) => url = resolve_next(&url, next),
            None => break,
        }
    }
    result
}

/// Resolve a `next` link, which may be absolute or relative to the page that produced it.
pub fn resolve_next(current: &str, next: &str) -> EndpointUrl {
    match Url::parse(next) {
        Ok(absolute) => absolute.into(),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(current)
            .and_then(|base| base.join(next))
            .map(String::from)
            .unwrap_or_else(|_| next.to_string()),
        Err(_) => next.to_string(),
    }
}
