// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Returns `true` for the self and parent markers that some platforms report
/// while enumerating a directory.
pub fn is_dot_entry(name: &OsStr) -> bool {
    name == OsStr::new(".") || name == OsStr::new("..")
}

/// Joins a single directory entry `name` onto `base`.
///
/// The storage for the result is reserved fallibly, so allocation failure is
/// reported as [`ResourceExhausted`](crate::ErrorKind::ResourceExhausted)
/// instead of aborting the process.
///
/// `name` must be exactly one normal path component: entry names never
/// contain separators, and a name that does (or that is empty, absolute, or a
/// dot marker) would make the join point outside of `base`.
pub fn join_entry(base: &Path, name: &OsStr) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return Err(Error::invalid_input("directory entry name is not a single path component")),
    }

    let mut storage = OsString::new();
    storage
        .try_reserve_exact(base.as_os_str().len() + 1 + name.len())
        .map_err(|_reserve| Error::out_of_memory("path join"))?;

    let mut joined = PathBuf::from(storage);
    joined.push(base);
    joined.push(name);
    Ok(joined)
}

/// Copies `path` into freshly, fallibly reserved storage.
pub fn copy_path(path: &Path) -> Result<PathBuf> {
    let mut storage = OsString::new();
    storage
        .try_reserve_exact(path.as_os_str().len())
        .map_err(|_reserve| Error::out_of_memory("path copy"))?;
    storage.push(path.as_os_str());
    Ok(PathBuf::from(storage))
}
