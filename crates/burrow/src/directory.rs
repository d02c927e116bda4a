// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::path::{Path, PathBuf};

use ohno::EnrichableExt as _;

use crate::dir_entry::DirEntry;
use crate::error::{Error, Result};
use crate::path_utils::is_dot_entry;

/// An open handle for enumerating the entries of a directory.
///
/// Entries are fetched lazily from the platform on each call to
/// [`read`](Directory::read). The handle must be released with
/// [`close`](Directory::close), which is idempotent: closing an already closed
/// handle is a no-op. Any other operation on a closed handle fails with
/// [`ErrorKind::Closed`](crate::ErrorKind::Closed). Dropping an open handle
/// closes it.
#[derive(Debug)]
pub struct Directory {
    path: PathBuf,
    handle: Option<std::fs::ReadDir>,
}

impl Directory {
    /// Opens the directory at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist, is not a directory, or if
    /// the process lacks permission to read it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let handle = open_read_dir(&path)?;
        Ok(Self {
            path,
            handle: Some(handle),
        })
    }

    /// Returns the path this handle was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Returns the next entry, or `None` once the directory is exhausted.
    ///
    /// The self and parent markers (`.` and `..`) are never returned.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::Closed`](crate::ErrorKind::Closed) on a closed
    /// handle, or with the platform error if reading an entry fails.
    pub fn read(&mut self) -> Result<Option<DirEntry>> {
        let handle = self.handle.as_mut().ok_or_else(|| Error::closed("directory handle"))?;
        loop {
            match handle.next() {
                None => return Ok(None),
                Some(Ok(entry)) => {
                    if is_dot_entry(&entry.file_name()) {
                        continue;
                    }
                    return Ok(Some(DirEntry::from_std(&entry)));
                }
                Some(Err(e)) => {
                    let path = &self.path;
                    return Err(Error::from(e)).enrich_with(|| format!("failed to read an entry of {}", path.display()));
                }
            }
        }
    }

    /// Returns an iterator over the remaining entries.
    pub fn entries(&mut self) -> Entries<'_> {
        Entries { directory: self }
    }

    /// Restarts enumeration from the first entry.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::Closed`](crate::ErrorKind::Closed) on a closed
    /// handle, or with the platform error if the directory cannot be reopened
    /// (for example because it was removed in the meantime).
    pub fn rewind(&mut self) -> Result<()> {
        if self.handle.is_none() {
            return Err(Error::closed("directory handle"));
        }
        self.handle = Some(open_read_dir(&self.path)?);
        Ok(())
    }

    /// Releases the handle.
    ///
    /// # Errors
    ///
    /// Releasing a standard library directory stream cannot fail; the
    /// signature leaves room for handles that report close failures.
    pub fn close(&mut self) -> Result<()> {
        drop(self.handle.take());
        Ok(())
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_closed() { "closed " } else { "" };
        write!(f, "{prefix}directory ({})", self.path.display())
    }
}

/// Iterator over the remaining entries of a [`Directory`].
///
/// Returned by [`Directory::entries`].
#[derive(Debug)]
pub struct Entries<'a> {
    directory: &'a mut Directory,
}

impl Iterator for Entries<'_> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.directory.read().transpose()
    }
}

fn open_read_dir(path: &Path) -> Result<std::fs::ReadDir> {
    std::fs::read_dir(path)
        .map_err(Error::from)
        .enrich_with(|| format!("failed to open directory {}", path.display()))
}
