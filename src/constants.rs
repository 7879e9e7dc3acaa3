/// Constants used for the on-disk layout under the configuration root.
pub mod paths {
    /// Application name used to resolve the platform configuration directory.
    pub const APPLICATION_NAME: &str = "litch";
    /// Directory (under the root) holding cached remote data.
    pub const CACHE_DIR_NAME: &str = "cache";
    /// Directory (under the root) holding user-curated data.
    pub const LOCAL_DIR_NAME: &str = "local";
    /// File name of a serialized record collection in either directory.
    pub const CATALOG_FILENAME: &str = "spells.json";
    /// File name of the durable event log.
    pub const LOG_FILENAME: &str = "log.txt";
    /// Environment variable overriding the configuration root.
    pub const ROOT_ENV_VAR: &str = "LITCH_ROOT";
}

/// Constants used by the remote catalog source.
pub mod remote {
    /// Default paginated remote endpoint.
    pub const DEFAULT_ENDPOINT: &str = "https://api.open5e.com/spells/";
    /// Environment variable overriding the remote endpoint.
    pub const ENDPOINT_ENV_VAR: &str = "LITCH_ENDPOINT";
    /// Wire value that maps boolean-like fields to `true`.
    pub const WIRE_TRUE: &str = "yes";
    /// Wire value rendered for `false` boolean-like fields.
    pub const WIRE_FALSE: &str = "no";
    /// Delimiter of list-valued wire fields.
    pub const LIST_DELIMITER: char = ',';
    /// Separator between class and detail in `archetype` tokens.
    pub const ARCHETYPE_SEPARATOR: &str = ": ";
    /// Class name that the remote lists as an affiliation but is not one.
    pub const EXCLUDED_CLASS: &str = "Ritual Caster";
    /// Class that `circles` tokens belong to.
    ///
    /// Circle dedup only matches archetype entries rendered with this exact
    /// prefix; if the remote renames it, duplicates reappear.
    pub const CIRCLE_CLASS: &str = "Druid";
}

/// Constants used by source names and pipeline status reporting.
pub mod pipeline {
    /// Name of the user-curated source.
    pub const CUSTOM_SOURCE_NAME: &str = "custom spells";
    /// Name of the remote source.
    pub const REMOTE_SOURCE_NAME: &str = "remote spells";
    /// Status forwarded when a fetch cycle starts.
    pub const STATUS_LOADING: &str = "Loading spells...";
    /// Status forwarded once a cycle has delivered its collection.
    pub const STATUS_DONE: &str = "Done";
    /// How often a waiting consumer rechecks whether the cycle is still in flight.
    pub const DELIVERY_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);
}

/// Constants used by the cache writer.
pub mod cache {
    /// Indent used for pretty-printed collection files.
    pub const JSON_INDENT: &[u8] = b"    ";
}
