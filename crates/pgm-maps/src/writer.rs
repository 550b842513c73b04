use std::path::{Path, PathBuf};

use crate::layout::MapTarget;

/// Errors that can occur while persisting a map.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A map already present in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// Blob SHA recorded in the marker beside the image.
    pub sha: String,
}

/// Writes map images (and their SHA markers) under an output directory.
#[derive(Debug, Clone)]
pub struct MapWriter {
    out_dir: PathBuf,
}

impl MapWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// The local copy at `target`, if both image and marker exist.
    /// An unreadable or empty marker counts as no local copy.
    pub fn local_file(&self, target: &MapTarget) -> Option<LocalFile> {
        let path = target.image_path(&self.out_dir);
        if !path.is_file() {
            return None;
        }

        let sha = std::fs::read_to_string(target.marker_path(&self.out_dir)).ok()?;
        let sha = sha.trim();
        if sha.is_empty() {
            return None;
        }

        Some(LocalFile {
            path,
            sha: sha.to_owned(),
        })
    }

    /// Write `bytes` to the target's `map.png`, creating directories as needed.
    ///
    /// The marker is written after the image, so an interrupted write leaves
    /// the map looking stale rather than up to date.
    pub fn write(
        &self,
        target: &MapTarget,
        bytes: &[u8],
        sha: &str,
    ) -> Result<LocalFile, WriteError> {
        let dir = self.out_dir.join(target.relative_dir());
        std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        let path = target.image_path(&self.out_dir);
        std::fs::write(&path, bytes).map_err(|e| io_error(&path, e))?;

        let marker = target.marker_path(&self.out_dir);
        std::fs::write(&marker, sha).map_err(|e| io_error(&marker, e))?;

        Ok(LocalFile {
            path,
            sha: sha.to_owned(),
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.to_owned(),
        source,
    }
}
