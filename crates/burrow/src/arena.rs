// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Scoped, bulk-released storage for path strings.
//!
//! An [`Arena`] hands out [`ArenaPath`] handles instead of references, so the
//! arena can be cleared while handles still exist. Clearing bumps the arena's
//! generation; resolving a handle from an older generation fails with
//! [`ErrorKind::Closed`](crate::ErrorKind::Closed) rather than yielding a
//! recycled path. Dropping the arena destroys it.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path_utils::{copy_path, join_entry};

const INITIAL_SLOTS: usize = 16;

/// A handle to a path allocated in an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaPath {
    index: usize,
    generation: u64,
}

/// A region of path allocations released together.
#[derive(Debug)]
pub struct Arena {
    paths: Vec<PathBuf>,
    generation: u64,
    peak_len: usize,
    clears: usize,
}

impl Arena {
    /// Creates an empty arena.
    ///
    /// # Errors
    ///
    /// Fails with [`ResourceExhausted`](crate::ErrorKind::ResourceExhausted)
    /// if the initial bookkeeping cannot be allocated.
    pub fn new() -> Result<Self> {
        let mut paths = Vec::new();
        paths
            .try_reserve(INITIAL_SLOTS)
            .map_err(|_reserve| Error::out_of_memory("arena creation"))?;
        Ok(Self {
            paths,
            generation: 0,
            peak_len: 0,
            clears: 0,
        })
    }

    /// Allocates the join of `base` and the entry `name`.
    pub fn join(&mut self, base: &Path, name: &OsStr) -> Result<ArenaPath> {
        let joined = join_entry(base, name)?;
        self.insert(joined)
    }

    /// Allocates a copy of `path`.
    pub fn copy(&mut self, path: &Path) -> Result<ArenaPath> {
        let copied = copy_path(path)?;
        self.insert(copied)
    }

    /// Resolves a handle allocated by this arena since its last clear.
    pub fn get(&self, handle: ArenaPath) -> Result<&Path> {
        if handle.generation != self.generation {
            return Err(Error::closed("arena path used after its arena was cleared"));
        }
        self.paths
            .get(handle.index)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::closed("arena path does not belong to this arena"))
    }

    /// Releases every allocation, keeping the arena usable.
    pub fn clear(&mut self) {
        self.paths.clear();
        self.generation += 1;
        self.clears += 1;
    }

    /// Number of live allocations.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// The highest number of allocations that were live at the same time.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }

    /// How many times [`clear`](Self::clear) has run.
    pub fn clears(&self) -> usize {
        self.clears
    }

    fn insert(&mut self, path: PathBuf) -> Result<ArenaPath> {
        self.paths
            .try_reserve(1)
            .map_err(|_reserve| Error::out_of_memory("arena allocation"))?;
        let handle = ArenaPath {
            index: self.paths.len(),
            generation: self.generation,
        };
        self.paths.push(path);
        self.peak_len = self.peak_len.max(self.paths.len());
        Ok(handle)
    }
}
