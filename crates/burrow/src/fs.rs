// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use ohno::EnrichableExt as _;

use crate::dir_entry::{DirEntry, EntryType};
use crate::directory::Directory;
use crate::error::{Error, Result};

/// The filesystem calls that [`TreeDeleter`](crate::TreeDeleter) is built on.
///
/// [`StdFilesystem`] maps these onto [`std::fs`]. Other implementations can
/// instrument or restrict removal, for example to observe removal order or to
/// inject failures.
pub trait Filesystem {
    /// Handle type produced by [`open_dir`](Self::open_dir).
    type Enumerator: Enumerator;

    /// Reports what `path` itself is, without following a symbolic link.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist or cannot be inspected.
    fn entry_type(&self, path: &Path) -> Result<EntryType>;

    /// Opens `path` for enumeration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be opened.
    fn open_dir(&self, path: &Path) -> Result<Self::Enumerator>;

    /// Removes one non-directory entry (file, symlink, special file).
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be removed.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Removes an empty directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is not empty or cannot be removed.
    fn remove_empty_dir(&self, path: &Path) -> Result<()>;
}

/// A stateful producer of directory entries.
pub trait Enumerator {
    /// Returns the next entry, or `None` when the directory is exhausted.
    ///
    /// Implementations may return the `.` and `..` markers; callers skip them.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be read.
    fn read_next(&mut self) -> Result<Option<DirEntry>>;

    /// Releases the handle. Closing twice must be a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform reports a failure while releasing.
    fn close(&mut self) -> Result<()>;
}

impl Enumerator for Directory {
    fn read_next(&mut self) -> Result<Option<DirEntry>> {
        self.read()
    }

    fn close(&mut self) -> Result<()> {
        Self::close(self)
    }
}

/// The [`Filesystem`] of the running platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    type Enumerator = Directory;

    fn entry_type(&self, path: &Path) -> Result<EntryType> {
        std::fs::symlink_metadata(path)
            .map(|metadata| EntryType::from_file_type(metadata.file_type()))
            .map_err(Error::from)
            .enrich_with(|| format!("failed to read metadata of {}", path.display()))
    }

    fn open_dir(&self, path: &Path) -> Result<Directory> {
        Directory::open(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path)
            .map_err(Error::from)
            .enrich_with(|| format!("failed to remove file {}", path.display()))
    }

    fn remove_empty_dir(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir(path)
            .map_err(Error::from)
            .enrich_with(|| format!("failed to remove directory {}", path.display()))
    }
}
