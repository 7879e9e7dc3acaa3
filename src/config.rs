use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::constants::paths::{
    APPLICATION_NAME, CACHE_DIR_NAME, CATALOG_FILENAME, LOCAL_DIR_NAME, LOG_FILENAME, ROOT_ENV_VAR,
};
use crate::constants::pipeline::{CUSTOM_SOURCE_NAME, REMOTE_SOURCE_NAME};
use crate::constants::remote::{DEFAULT_ENDPOINT, ENDPOINT_ENV_VAR};
use crate::errors::CatalogError;
use crate::types::{EndpointUrl, SourceName};

/// A configured origin of records: a local file, a remote endpoint, both, or neither.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    name: SourceName,
    local_path: Option<PathBuf>,
    remote_endpoint: Option<EndpointUrl>,
}

impl Source {
    /// Create a source with neither a local path nor a remote endpoint.
    pub fn new(name: impl Into<SourceName>) -> Self {
        Self {
            name: name.into(),
            local_path: None,
            remote_endpoint: None,
        }
    }

    /// Set the local file; an empty path leaves it unset.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.local_path = (!path.as_os_str().is_empty()).then_some(path);
        self
    }

    /// Set the remote endpoint; an empty or blank string means local-only.
    pub fn with_remote_endpoint(mut self, endpoint: impl Into<EndpointUrl>) -> Self {
        let endpoint = endpoint.into();
        self.remote_endpoint = (!endpoint.trim().is_empty()).then_some(endpoint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub fn remote_endpoint(&self) -> Option<&str> {
        self.remote_endpoint.as_deref()
    }
}

/// Process-wide catalog configuration.
///
/// The root holds two sibling directories, `cache` for remote-derived data
/// and `local` for user-curated data, plus the event log.
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// Configuration root directory.
    pub root: PathBuf,
    /// Paginated remote endpoint; empty disables the remote source.
    pub remote_endpoint: EndpointUrl,
    /// File name used for collection files in both directories.
    pub catalog_filename: String,
}

impl CatalogConfig {
    /// Create a config rooted at `root` with the default endpoint and file name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            remote_endpoint: DEFAULT_ENDPOINT.to_string(),
            catalog_filename: CATALOG_FILENAME.to_string(),
        }
    }

    /// Override the remote endpoint.
    pub fn with_remote_endpoint(mut self, endpoint: impl Into<EndpointUrl>) -> Self {
        self.remote_endpoint = endpoint.into();
        self
    }

    /// Override the collection file name.
    pub fn with_catalog_filename(mut self, filename: impl Into<String>) -> Self {
        self.catalog_filename = filename.into();
        self
    }

    /// Resolve root and endpoint by explicit value, then environment, then defaults.
    pub fn resolve(
        root: Option<PathBuf>,
        endpoint: Option<EndpointUrl>,
    ) -> Result<Self, CatalogError> {
        Self::resolve_with(root, endpoint, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        root: Option<PathBuf>,
        endpoint: Option<EndpointUrl>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CatalogError> {
        let non_empty = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
        let root = match root.or_else(|| non_empty(env(ROOT_ENV_VAR)).map(PathBuf::from)) {
            Some(root) => root,
            None => default_root()?,
        };
        let mut config = Self::new(root);
        if let Some(endpoint) = endpoint.or_else(|| non_empty(env(ENDPOINT_ENV_VAR))) {
            config.remote_endpoint = endpoint;
        }
        Ok(config)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(CACHE_DIR_NAME)
    }

    pub fn local_dir(&self) -> PathBuf {
        self.root.join(LOCAL_DIR_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILENAME)
    }

    /// User-curated source; local file only.
    pub fn custom_source(&self) -> Source {
        Source::new(CUSTOM_SOURCE_NAME).with_local_path(self.local_dir().join(&self.catalog_filename))
    }

    /// Remote source cached under the cache directory.
    pub fn remote_source(&self) -> Source {
        Source::new(REMOTE_SOURCE_NAME)
            .with_local_path(self.cache_dir().join(&self.catalog_filename))
            .with_remote_endpoint(self.remote_endpoint.clone())
    }

    /// Configured sources in merge precedence order, highest first.
    pub fn sources(&self) -> Vec<Source> {
        vec![self.custom_source(), self.remote_source()]
    }
}

fn default_root() -> Result<PathBuf, CatalogError> {
    ProjectDirs::from("", "", APPLICATION_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            CatalogError::Configuration("could not resolve user configuration directory".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_paths_and_endpoints_mean_unset() {
        let source = Source::new("blank")
            .with_local_path("")
            .with_remote_endpoint("   ");
        assert_eq!(source.local_path(), None);
        assert_eq!(source.remote_endpoint(), None);
    }

    #[test]
    fn sources_list_custom_before_remote() {
        let config = CatalogConfig::new("/tmp/litch-root");
        let sources = config.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name(), CUSTOM_SOURCE_NAME);
        assert_eq!(
            sources[0].local_path(),
            Some(Path::new("/tmp/litch-root/local/spells.json"))
        );
        assert_eq!(sources[0].remote_endpoint(), None);
        assert_eq!(sources[1].name(), REMOTE_SOURCE_NAME);
        assert_eq!(
            sources[1].local_path(),
            Some(Path::new("/tmp/litch-root/cache/spells.json"))
        );
        assert_eq!(sources[1].remote_endpoint(), Some(DEFAULT_ENDPOINT));
    }

    #[test]
    fn resolve_prefers_explicit_then_environment() {
        let env: HashMap<&str, &str> = [
            (ROOT_ENV_VAR, "/env/root"),
            (ENDPOINT_ENV_VAR, "http://env.example/spells/"),
        ]
        .into_iter()
        .collect();
        let lookup = |key: &str| env.get(key).map(|value| value.to_string());

        let from_env = CatalogConfig::resolve_with(None, None, lookup).unwrap();
        assert_eq!(from_env.root, PathBuf::from("/env/root"));
        assert_eq!(from_env.remote_endpoint, "http://env.example/spells/");

        let explicit = CatalogConfig::resolve_with(
            Some(PathBuf::from("/explicit")),
            Some("http://explicit.example/".into()),
            lookup,
        )
        .unwrap();
        assert_eq!(explicit.root, PathBuf::from("/explicit"));
        assert_eq!(explicit.remote_endpoint, "http://explicit.example/");
    }

    #[test]
    fn blank_environment_values_fall_back_to_defaults() {
        let config = CatalogConfig::resolve_with(Some(PathBuf::from("/r")), None, |_| {
            Some(String::new())
        })
        .unwrap();
        assert_eq!(config.remote_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.log_path(), PathBuf::from("/r/log.txt"));
    }
}
