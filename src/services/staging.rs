use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Allocate an empty temp file for an inbound document, preserving the
/// original extension so the backend sees the right suffix.
///
/// The file is kept past the handle's lifetime; terminal conversation paths
/// are responsible for removing it via [`discard_staged`].
pub fn allocate_staged(file_name: &str) -> io::Result<PathBuf> {
    let suffix = Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let (_, path) = tempfile::Builder::new()
        .prefix("relay-")
        .suffix(&suffix)
        .tempfile()?
        .keep()?;
    Ok(path)
}

/// Best-effort removal of a staged file. Never fails: conversation paths
/// call this unconditionally, including paths where the file may already be
/// gone, and a deletion failure must not abort the flow.
pub fn discard_staged(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed staged file"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), "failed to remove staged file: {}", err),
    }
}
