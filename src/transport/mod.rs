/// Filesystem helpers for collection files and directories.
pub mod fs;
/// HTTP transport seam used by remote sources.
pub mod http;
