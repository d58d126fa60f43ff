//! Destination directory checks and asset file writes.

mod writer;

pub use writer::StorageWriter;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Why the destination directory can't be used. Fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not writable: {source}")]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const WRITE_PROBE: &str = ".confdl-write-probe";

/// Make sure `dir` exists, is a directory and accepts new files.
/// Creates missing parents.
pub fn prepare_destination(dir: &Path) -> Result<(), DestinationError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(DestinationError::NotADirectory(dir.to_path_buf()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|source| DestinationError::Create {
            path: dir.to_path_buf(),
            source,
        })?;
        tracing::info!("created destination directory {}", dir.display());
    }

    let probe = dir.join(WRITE_PROBE);
    fs::write(&probe, b"")
        .and_then(|()| fs::remove_file(&probe))
        .map_err(|source| DestinationError::NotWritable {
            path: dir.to_path_buf(),
            source,
        })
}
