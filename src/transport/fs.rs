use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

/// True if `path` exists.
///
/// Metadata errors other than "not found" count as existing so that the
/// subsequent read surfaces the real error instead of silently skipping the file.
pub fn file_exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(true)
}

/// Create `dir` (and parents) if it does not exist. Returns `true` if it was created.
pub fn ready_dir(dir: &Path) -> io::Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    debug!(dir = %dir.display(), "directory does not exist, creating");
    fs::create_dir_all(dir)?;
    Ok(true)
}

/// Read and deserialize a JSON document from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> io::Result<T> {
    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(value)
}
