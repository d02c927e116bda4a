// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Recursive directory deletion with bounded bookkeeping memory.
//!
//! Deletion runs in two phases. The first walks the tree with an explicit
//! stack, deleting every non-directory entry as soon as it is enumerated and
//! recording each directory once it has been emptied. The second removes the
//! recorded directories in reverse order of completion, so every directory is
//! removed only after all of its descendants.
//!
//! Three [`Arena`]s with different lifetimes hold the path strings:
//!
//! * the *outer* arena lives for the whole call and owns every directory path
//!   referenced by the work and completed lists;
//! * the *middle* arena is scratch for directory-level calls. It is cleared
//!   before each directory is opened and, during the second phase, every
//!   [`dir_clear_interval`](DeleteOptions::dir_clear_interval) removals;
//! * the *inner* arena holds the path of each non-directory entry just long
//!   enough to remove it, and is cleared every
//!   [`inner_clear_interval`](DeleteOptions::inner_clear_interval) allocations.
//!
//! There is no rollback: a failure leaves whatever was already removed
//! removed.

use std::path::Path;

use tracing::{debug, trace};

use crate::arena::{Arena, ArenaPath};
use crate::dir_entry::EntryType;
use crate::error::{Error, Result};
use crate::fs::{Enumerator, Filesystem, StdFilesystem};
use crate::path_utils::is_dot_entry;

/// Default number of inner-arena allocations between clears.
pub const DEFAULT_INNER_CLEAR_INTERVAL: usize = 1000;

/// Default number of directory removals between middle-arena clears.
pub const DEFAULT_DIR_CLEAR_INTERVAL: usize = 100;

/// Deletes the directory at `root` and everything below it.
///
/// Symbolic links inside the tree are removed, never followed. If `root` is
/// itself a symbolic link, only the link is removed.
///
/// # Errors
///
/// Returns the first error encountered. Entries removed before the failure
/// stay removed; no rollback is attempted. An entry that disappears between
/// enumeration and removal is reported as
/// [`ErrorKind::NotFound`](crate::ErrorKind::NotFound).
///
/// # Examples
///
/// ```no_run
/// # fn example() -> burrow::Result<()> {
/// burrow::delete_tree("/var/cache/my-app")?;
/// # Ok(())
/// # }
/// ```
pub fn delete_tree(root: impl AsRef<Path>) -> Result<()> {
    TreeDeleter::new(DeleteOptions::default()).delete(root).map(|_stats| ())
}

/// Tuning for [`TreeDeleter`].
///
/// The intervals trade peak bookkeeping memory against the cost of clearing
/// arenas too often. An interval of zero behaves like one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteOptions {
    inner_clear_interval: usize,
    dir_clear_interval: usize,
}

impl DeleteOptions {
    /// Creates options with the default intervals.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner_clear_interval: DEFAULT_INNER_CLEAR_INTERVAL,
            dir_clear_interval: DEFAULT_DIR_CLEAR_INTERVAL,
        }
    }

    /// Sets how many file paths may accumulate before the inner arena is
    /// cleared.
    #[must_use]
    pub const fn inner_clear_interval(mut self, interval: usize) -> Self {
        self.inner_clear_interval = if interval == 0 { 1 } else { interval };
        self
    }

    /// Sets how many directory removals may happen before the middle arena is
    /// cleared.
    #[must_use]
    pub const fn dir_clear_interval(mut self, interval: usize) -> Self {
        self.dir_clear_interval = if interval == 0 { 1 } else { interval };
        self
    }
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters describing a completed deletion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct DeleteStats {
    /// Non-directory entries removed.
    pub files_removed: usize,
    /// Directories removed, including the root.
    pub dirs_removed: usize,
    /// Times the inner arena was cleared.
    pub inner_clears: usize,
    /// Times the middle arena was cleared.
    pub middle_clears: usize,
    /// Most directory paths held by the outer arena at once.
    pub outer_peak: usize,
    /// Most paths held by the middle arena at once.
    pub middle_peak: usize,
    /// Most file paths held by the inner arena at once.
    pub inner_peak: usize,
}

/// Deletes directory trees through a [`Filesystem`].
///
/// # Examples
///
/// ```no_run
/// use burrow::{DeleteOptions, TreeDeleter};
///
/// # fn example() -> burrow::Result<()> {
/// let deleter = TreeDeleter::new(DeleteOptions::new().inner_clear_interval(256));
/// let stats = deleter.delete("/tmp/build-output")?;
/// println!("removed {} files", stats.files_removed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TreeDeleter<F = StdFilesystem> {
    fs: F,
    options: DeleteOptions,
}

impl TreeDeleter<StdFilesystem> {
    /// Creates a deleter operating on the real filesystem.
    #[must_use]
    pub const fn new(options: DeleteOptions) -> Self {
        Self {
            fs: StdFilesystem,
            options,
        }
    }
}

impl<F: Filesystem> TreeDeleter<F> {
    /// Creates a deleter operating on `fs`.
    #[must_use]
    pub const fn with_filesystem(fs: F, options: DeleteOptions) -> Self {
        Self { fs, options }
    }

    /// Returns the filesystem this deleter operates on.
    #[must_use]
    pub const fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Deletes `root` and everything below it.
    ///
    /// # Errors
    ///
    /// See [`delete_tree`]. Bookkeeping allocation failures are reported as
    /// [`ErrorKind::ResourceExhausted`](crate::ErrorKind::ResourceExhausted);
    /// if the arenas cannot be created, nothing on disk has been touched.
    pub fn delete(&self, root: impl AsRef<Path>) -> Result<DeleteStats> {
        let root = root.as_ref();
        debug!(root = %root.display(), "deleting directory tree");

        let mut run = Run::new(&self.fs, self.options)?;
        let result = self.fs.entry_type(root).and_then(|root_type| {
            if root_type == EntryType::Symlink {
                run.remove_link(root)
            } else {
                run.empty_directories(root).and_then(|()| run.remove_directories())
            }
        });

        match result {
            Ok(()) => {
                let stats = run.stats();
                debug!(
                    root = %root.display(),
                    files = stats.files_removed,
                    dirs = stats.dirs_removed,
                    inner_clears = stats.inner_clears,
                    middle_clears = stats.middle_clears,
                    "deleted directory tree"
                );
                Ok(stats)
            }
            Err(error) => {
                debug!(root = %root.display(), %error, "directory tree deletion aborted");
                Err(error)
            }
        }
    }
}

/// State of one deletion call. Dropping it closes any enumerator still open
/// and destroys the three arenas, whichever way the call ends.
struct Run<'a, F: Filesystem> {
    fs: &'a F,
    options: DeleteOptions,
    outer: Arena,
    middle: Arena,
    inner: Arena,
    todo: Vec<ArenaPath>,
    done: Vec<ArenaPath>,
    open: Option<F::Enumerator>,
    files_removed: usize,
    dirs_removed: usize,
}

impl<'a, F: Filesystem> Run<'a, F> {
    fn new(fs: &'a F, options: DeleteOptions) -> Result<Self> {
        Ok(Self {
            fs,
            options,
            outer: Arena::new()?,
            middle: Arena::new()?,
            inner: Arena::new()?,
            todo: Vec::new(),
            done: Vec::new(),
            open: None,
            files_removed: 0,
            dirs_removed: 0,
        })
    }

    /// Removes a root that is a symbolic link, leaving its target alone.
    fn remove_link(&mut self, root: &Path) -> Result<()> {
        self.fs.remove_file(root)?;
        self.files_removed += 1;
        trace!(path = %root.display(), "removed symbolic link root");
        Ok(())
    }

    /// Phase one: deletes every non-directory entry and records each
    /// directory, in the order it became empty.
    fn empty_directories(&mut self, root: &Path) -> Result<()> {
        let Self {
            fs,
            options,
            outer,
            middle,
            inner,
            todo,
            done,
            open,
            files_removed,
            ..
        } = self;

        let root = outer.copy(root)?;
        push(todo, root)?;

        while let Some(dir) = todo.pop() {
            middle.clear();
            let staged = middle.copy(outer.get(dir)?)?;
            let dir_path = middle.get(staged)?;
            let enumerator = open.insert(fs.open_dir(dir_path)?);

            while let Some(entry) = enumerator.read_next()? {
                let name = entry.file_name();
                if is_dot_entry(name) {
                    continue;
                }

                if entry.is_dir() {
                    let child = outer.join(dir_path, name)?;
                    push(todo, child)?;
                } else {
                    if inner.len() >= options.inner_clear_interval {
                        inner.clear();
                    }
                    let file = inner.join(dir_path, name)?;
                    let file_path = inner.get(file)?;
                    fs.remove_file(file_path)?;
                    *files_removed += 1;
                    trace!(path = %file_path.display(), "removed file");
                }
            }

            if let Some(mut enumerator) = open.take() {
                enumerator.close()?;
            }
            push(done, dir)?;
        }

        Ok(())
    }

    /// Phase two: removes the emptied directories, deepest completion first.
    fn remove_directories(&mut self) -> Result<()> {
        let Self {
            fs,
            options,
            outer,
            middle,
            done,
            dirs_removed,
            ..
        } = self;

        while let Some(dir) = done.pop() {
            if middle.len() >= options.dir_clear_interval {
                middle.clear();
            }
            let staged = middle.copy(outer.get(dir)?)?;
            let dir_path = middle.get(staged)?;
            fs.remove_empty_dir(dir_path)?;
            *dirs_removed += 1;
            trace!(path = %dir_path.display(), "removed directory");
        }

        Ok(())
    }

    fn stats(&self) -> DeleteStats {
        DeleteStats {
            files_removed: self.files_removed,
            dirs_removed: self.dirs_removed,
            inner_clears: self.inner.clears(),
            middle_clears: self.middle.clears(),
            outer_peak: self.outer.peak_len(),
            middle_peak: self.middle.peak_len(),
            inner_peak: self.inner.peak_len(),
        }
    }
}

impl<F: Filesystem> Drop for Run<'_, F> {
    fn drop(&mut self) {
        if let Some(mut enumerator) = self.open.take() {
            // The call already failed; the original error is what gets reported.
            let _ = enumerator.close();
        }
    }
}

fn push(list: &mut Vec<ArenaPath>, path: ArenaPath) -> Result<()> {
    list.try_reserve(1)
        .map_err(|_reserve| Error::out_of_memory("deletion work list"))?;
    list.push(path);
    Ok(())
}
