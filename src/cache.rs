//! Best-effort caching of fetched remote collections.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::constants::cache::JSON_INDENT;
use crate::data::Record;
use crate::errors::CatalogError;
use crate::event::{EventReporter, Severity};

/// Serialize `records` to `path` as indented JSON, creating the parent directory first.
pub fn write_collection(
    source_name: &str,
    path: &Path,
    records: &[Record],
) -> Result<(), CatalogError> {
    let failure = |stage: &str, err: &dyn std::fmt::Display| CatalogError::CacheWrite {
        source_name: source_name.to_string(),
        path: path.display().to_string(),
        reason: format!("{stage}: {err}"),
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| failure("creating directory", &err))?;
    }
    let file = File::create(path).map_err(|err| failure("creating file", &err))?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(JSON_INDENT));
    records
        .serialize(&mut serializer)
        .map_err(|err| failure("serializing", &err))?;
    writer.flush().map_err(|err| failure("writing", &err))?;
    Ok(())
}

/// Write `records` to `path` on a detached thread.
///
/// Outcome is reported through `reporter`; the returned handle may be dropped
/// to detach completely.
pub fn spawn_cache_write(
    source_name: String,
    path: PathBuf,
    records: Vec<Record>,
    reporter: Arc<EventReporter>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        debug!(source = %source_name, path = %path.display(), records = records.len(), "cache write started");
        match write_collection(&source_name, &path, &records) {
            Ok(()) => reporter.register(
                Severity::Info,
                &format!(
                    "Cached {} records for {source_name} to {}",
                    records.len(),
                    path.display()
                ),
                &format!("Cached {source_name}"),
            ),
            Err(err) => reporter.register(
                Severity::Error,
                &err.to_string(),
                &format!("Could not cache {source_name}"),
            ),
        }
    })
}
