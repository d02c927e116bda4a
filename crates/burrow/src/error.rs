// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::io;

use ohno::ErrorExt as _;

/// The category of an [`Error`].
///
/// Callers branch on the kind rather than on platform error codes, which are
/// not guaranteed to be preserved bit-for-bit across platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Memory for bookkeeping could not be allocated.
    ResourceExhausted,

    /// A filesystem entry that was expected to exist does not.
    NotFound,

    /// Any other failure reported by the platform, such as a permission or
    /// locking error. The platform error is available as the error source.
    Io,

    /// The operation targeted a handle that was already closed, or an arena
    /// path that did not survive its arena being cleared.
    Closed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ResourceExhausted => "resource exhausted",
            Self::NotFound => "not found",
            Self::Io => "I/O error",
            Self::Closed => "use of a closed handle",
        };
        f.write_str(text)
    }
}

/// An error signaled by a filesystem operation in this crate.
///
/// The [`kind`](Error::kind) identifies the failure category. When the error
/// originates from the platform, the underlying [`std::io::Error`] is kept as
/// the error source and can be retrieved with [`io_error`](Error::io_error).
#[ohno::error]
#[display("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the platform error this error was created from, if any.
    #[must_use]
    pub fn io_error(&self) -> Option<&io::Error> {
        self.find_source::<io::Error>()
    }

    pub(crate) fn closed(what: &'static str) -> Self {
        Self::caused_by(ErrorKind::Closed, what)
    }

    pub(crate) fn out_of_memory(what: &'static str) -> Self {
        Self::caused_by(ErrorKind::ResourceExhausted, what)
    }

    pub(crate) fn invalid_input(message: &'static str) -> Self {
        io::Error::new(io::ErrorKind::InvalidInput, message).into()
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::OutOfMemory => ErrorKind::ResourceExhausted,
            _ => ErrorKind::Io,
        };
        Self::caused_by(kind, error)
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        let kind = match error.io_error() {
            Some(source) => source.kind(),
            None => match error.kind() {
                ErrorKind::ResourceExhausted => io::ErrorKind::OutOfMemory,
                ErrorKind::NotFound => io::ErrorKind::NotFound,
                ErrorKind::Io | ErrorKind::Closed => io::ErrorKind::Other,
            },
        };
        Self::new(kind, error)
    }
}

/// A `Result` that may contain an [`Error`] from this crate.
pub type Result<T> = std::result::Result<T, Error>;
