use thiserror::Error;
use tracing::debug;

/// Failure to obtain a response body for a URL.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Blocking HTTP GET used by remote sources.
///
/// Non-success statuses must be reported as failures.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<String, TransportFailure>;
}

/// `HttpTransport` backed by a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<String, TransportFailure> {
        debug!(url, "requesting remote page");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|err| TransportFailure(format!("request failed: {err}")))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|err| TransportFailure(format!("failed reading response body: {err}")))
    }
}
