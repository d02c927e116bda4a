// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Synchronous filesystem primitives that need more care than a single
//! platform call.
//!
//! This crate provides two independent pieces:
//!
//! 1. **Recursive tree deletion with bounded memory.** [`delete_tree`] removes
//!    a directory and everything below it. It walks the tree with an explicit
//!    stack instead of recursion, and keeps the path strings it needs in three
//!    scoped arenas that are cleared periodically, so bookkeeping memory does
//!    not grow with the size of any one directory. Directories are removed only
//!    after all of their descendants. A failure stops the walk and leaves the
//!    tree partially deleted; there is no rollback.
//!
//! 2. **Buffered files that reconcile seeks.** [`BufferedFile`] wraps a file
//!    with one fixed-capacity buffer used for both read-ahead and write-behind.
//!    [`BufferedFile::seek`] accounts for the bytes held in the buffer, so
//!    relative seeks are measured from where the application is rather than
//!    from the descriptor's read-ahead position, and seeking back inside the
//!    buffered window does not touch the file again.
//!
//! Both are blocking and single-threaded; neither spawns threads or needs a
//! runtime.
//!
//! # Deleting a tree
//!
//! ```no_run
//! # fn example() -> burrow::Result<()> {
//! burrow::delete_tree("/tmp/build-output")?;
//! # Ok(())
//! # }
//! ```
//!
//! [`TreeDeleter`] exposes the arena clear intervals through
//! [`DeleteOptions`] and reports what it did as [`DeleteStats`]. It runs over
//! any [`Filesystem`], which is how removal can be observed or restricted:
//!
//! ```no_run
//! use burrow::{DeleteOptions, StdFilesystem, TreeDeleter};
//!
//! # fn example() -> burrow::Result<()> {
//! let options = DeleteOptions::new().inner_clear_interval(512).dir_clear_interval(64);
//! let stats = TreeDeleter::with_filesystem(StdFilesystem, options).delete("/tmp/scratch")?;
//! println!("{} files, {} directories", stats.files_removed, stats.dirs_removed);
//! # Ok(())
//! # }
//! ```
//!
//! # Reading and writing through a buffer
//!
//! ```no_run
//! use burrow::{OpenMode, Whence};
//!
//! # fn example() -> burrow::Result<()> {
//! let mode: OpenMode = "r+".parse()?;
//! let mut file = mode.options().open("table.txt")?;
//!
//! let header = file.read_line()?;
//! let body_start = file.seek(Whence::Cur, 0)?;
//! let count = file.read_number()?;
//!
//! // Back to the start of the body; served from the buffer.
//! file.seek(Whence::Set, i64::try_from(body_start).unwrap_or(0))?;
//! file.write("42")?;
//! file.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Directories
//!
//! [`Directory`] is the enumeration handle [`delete_tree`] itself uses. It
//! skips the `.` and `..` markers, reports symbolic links without following
//! them, and can be rewound and closed explicitly.
//!
//! # Errors
//!
//! All operations return [`Error`], whose [`ErrorKind`] tells apart resource
//! exhaustion, missing entries, other platform failures, and use of a closed
//! handle. The platform error, when there is one, is available through
//! [`Error::io_error`].

pub use crate::buffered_file::{BufferedFile, Whence};
pub use crate::delete_tree::{
    DEFAULT_DIR_CLEAR_INTERVAL, DEFAULT_INNER_CLEAR_INTERVAL, DeleteOptions, DeleteStats, TreeDeleter, delete_tree,
};
pub use crate::dir_entry::{DirEntry, EntryType};
pub use crate::directory::{Directory, Entries};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::fs::{Enumerator, Filesystem, StdFilesystem};
pub use crate::open_options::{DEFAULT_BUFFER_CAPACITY, OpenMode, OpenOptions};

mod arena;
mod buffer;
mod buffered_file;
mod delete_tree;
mod dir_entry;
mod directory;
mod error;
mod fs;
mod open_options;
mod path_utils;
