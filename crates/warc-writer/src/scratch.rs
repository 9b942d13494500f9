//! Anonymous scratch files for buffering record bodies
//!
//! Record bodies are often spooled to disk before their final size is
//! known. A scratch file is created under a unique name in the configured
//! temp directory and unlinked straight away, so the storage lives only as
//! long as the returned handle. A crash before the body is attached to a
//! record leaves nothing behind.

use crate::{Result, TEMPFILE_PREFIX, WarcError};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Create an unlinked read/write scratch file in `temp_dir`.
///
/// The handle is positioned at offset 0. Callers should treat an error as
/// "buffering unavailable" and fall back to in-memory content.
pub fn warc_tempfile(temp_dir: Option<&Path>) -> Result<File> {
    let Some(dir) = temp_dir else {
        return Err(WarcError::TempFile(
            "no temporary directory configured".to_string(),
        ));
    };

    let named = tempfile::Builder::new()
        .prefix(TEMPFILE_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| {
            warn!("Failed to create scratch file in {}: {e}", dir.display());
            WarcError::TempFile(format!("failed to create in {}: {e}", dir.display()))
        })?;

    debug!("Created scratch file {}", named.path().display());

    // Dropping the path removes the directory entry; the handle keeps the
    // storage alive.
    let (file, path) = named.into_parts();
    path.close().map_err(|e| {
        WarcError::TempFile(format!("failed to unlink scratch file: {e}"))
    })?;

    Ok(file)
}
