// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::{OsStr, OsString};
use std::fs::FileType;

/// The kind of filesystem object a [`DirEntry`] names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// A symbolic link. Links are reported as such and never followed.
    Symlink,
    /// A pipe, socket, device or other special file.
    Other,
    /// The platform could not tell what the entry is.
    Unknown,
}

impl EntryType {
    pub(crate) fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// An entry within a directory.
///
/// This type is returned by [`Directory::read`](crate::Directory::read). It
/// carries only what enumeration can report cheaply: the bare name, the entry
/// type and whether the entry is a symbolic link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    name: OsString,
    entry_type: EntryType,
}

impl DirEntry {
    /// Captures name and type from a `std::fs::DirEntry`.
    ///
    /// The type is taken without following symlinks. When the platform cannot
    /// report it, the entry is still returned with [`EntryType::Unknown`].
    pub(crate) fn from_std(entry: &std::fs::DirEntry) -> Self {
        let entry_type = entry
            .file_type()
            .or_else(|_| std::fs::symlink_metadata(entry.path()).map(|m| m.file_type()))
            .map_or(EntryType::Unknown, EntryType::from_file_type);
        Self {
            name: entry.file_name(),
            entry_type,
        }
    }

    /// Creates an entry, for use by custom [`Filesystem`](crate::Filesystem)
    /// implementations.
    #[must_use]
    pub fn new(name: impl Into<OsString>, entry_type: EntryType) -> Self {
        Self {
            name: name.into(),
            entry_type,
        }
    }

    /// Returns the bare file name of this entry without any leading path
    /// component.
    #[must_use]
    pub fn file_name(&self) -> &OsStr {
        &self.name
    }

    /// Returns the type of this entry.
    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Returns `true` if this entry is a directory (and not a link to one).
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Returns `true` if this entry is a symbolic link.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.entry_type == EntryType::Symlink
    }
}
