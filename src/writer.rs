use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{GenerateError, Result};

/// Write `content` to `path` without ever exposing a partial file.
///
/// The text goes to a temporary file in the destination directory first and
/// is renamed over `path` once complete. Missing parent directories are
/// created.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;

    let mut file = NamedTempFile::new_in(parent).map_err(|e| GenerateError::io(parent, e))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| GenerateError::io(file.path(), e))?;
    file.persist(path).map_err(|e| GenerateError::io(path, e.error))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote output");
    Ok(())
}
