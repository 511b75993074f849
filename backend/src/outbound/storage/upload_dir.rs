//! `ImageStorage` backed by a capability-scoped upload directory.
//!
//! All access goes through a `cap_std::fs::Dir` opened once at start-up, so
//! stored paths are resolved strictly beneath the upload root. Paths that
//! are absolute or climb with `..` are refused before the filesystem is
//! touched.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ports::{ImageStorage, ImageStorageError};

/// Upload root holding image files referenced by `Image::file_path`.
#[derive(Clone)]
pub struct UploadDirectory {
    root: Arc<Dir>,
}

impl UploadDirectory {
    /// Open (creating when missing) the directory at `path`.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the directory cannot be
    /// created or opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let root = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self {
            root: Arc::new(root),
        })
    }
}

/// Reduce `file_path` to a relative path made only of normal components.
fn contained(file_path: &str) -> Result<PathBuf, ImageStorageError> {
    let mut relative = PathBuf::new();
    for component in Path::new(file_path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ImageStorageError::invalid_path(file_path));
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(ImageStorageError::invalid_path(file_path));
    }
    Ok(relative)
}

#[async_trait]
impl ImageStorage for UploadDirectory {
    async fn remove(&self, file_path: &str) -> Result<(), ImageStorageError> {
        let relative = contained(file_path)?;
        let root = Arc::clone(&self.root);
        let outcome = tokio::task::spawn_blocking(move || root.remove_file(&relative))
            .await
            .map_err(|err| ImageStorageError::io(format!("removal task: {err}")))?;
        match outcome {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(file_path, "stored image already absent");
                Ok(())
            }
            Err(error) => Err(ImageStorageError::io(error.to_string())),
        }
    }
}
