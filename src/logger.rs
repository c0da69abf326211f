use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;

use crate::error::Result;

pub const DEFAULT_LOG_FILE: &str = "qa_debug.log";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Send all `tracing` output to `path`, appending. Filter comes from
/// `RUST_LOG`, falling back to `info`. Later calls are no-ops.
pub fn init(path: &Path) -> Result<()> {
    if LOG_PATH.get().is_some() {
        return Ok(());
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();

    if installed.is_ok() {
        let _ = LOG_PATH.set(path.to_path_buf());
        tracing::info!(path = %path.display(), "logging initialised");
    }
    Ok(())
}

/// The file logs go to, once [`init`] has succeeded.
pub fn log_path() -> Option<&'static Path> {
    LOG_PATH.get().map(PathBuf::as_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");

        init(&first).unwrap();
        init(&second).unwrap();

        assert!(first.exists());
        assert!(!second.exists());
        assert_eq!(log_path(), Some(first.as_path()));
    }
}
