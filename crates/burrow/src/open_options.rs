// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ohno::EnrichableExt as _;

use crate::buffered_file::BufferedFile;
use crate::error::{Error, Result};

/// Default buffer size of files opened through [`OpenOptions`].
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

/// Options and flags which can be used to configure how a file is opened.
///
/// This builder exposes the ability to configure how a [`BufferedFile`] is
/// opened and what operations are permitted on it, mirroring
/// [`std::fs::OpenOptions`], plus the size of the handle's buffer.
///
/// Generally speaking, when using `OpenOptions`, you'll first call
/// [`OpenOptions::new`], then chain calls to methods to set each option, then
/// call [`OpenOptions::open`]. Options can also be parsed from a mode string
/// through [`OpenMode`].
///
/// # Examples
///
/// ```no_run
/// use burrow::OpenOptions;
///
/// # fn example() -> burrow::Result<()> {
/// let mut log = OpenOptions::new()
///     .append(true)
///     .create(true)
///     .buffer_capacity(64 * 1024)
///     .open("events.log")?;
/// log.write("started\n")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[expect(clippy::struct_excessive_bools, reason = "mirrors std::fs::OpenOptions API")]
pub struct OpenOptions {
    read: bool,
    write: bool,
    append: bool,
    truncate: bool,
    create: bool,
    create_new: bool,
    buffer_capacity: usize,
}

impl OpenOptions {
    /// Creates a blank new set of options ready for configuration.
    ///
    /// All flags are initially `false` and the buffer capacity is
    /// [`DEFAULT_BUFFER_CAPACITY`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            read: false,
            write: false,
            append: false,
            truncate: false,
            create: false,
            create_new: false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Sets the option for read access.
    pub const fn read(&mut self, read: bool) -> &mut Self {
        self.read = read;
        self
    }

    /// Sets the option for write access.
    ///
    /// If the file already exists, any write calls on it will overwrite its
    /// contents, without truncating it.
    pub const fn write(&mut self, write: bool) -> &mut Self {
        self.write = write;
        self
    }

    /// Sets the option for the append mode.
    ///
    /// Writes will append to the file instead of overwriting previous
    /// contents. This function doesn't create the file if it doesn't exist;
    /// use [`create`](OpenOptions::create) for that.
    pub const fn append(&mut self, append: bool) -> &mut Self {
        self.append = append;
        self
    }

    /// Sets the option for truncating a previous file.
    ///
    /// The file must be opened with write access for truncate to work.
    pub const fn truncate(&mut self, truncate: bool) -> &mut Self {
        self.truncate = truncate;
        self
    }

    /// Sets the option to create a new file, or open it if it already exists.
    pub const fn create(&mut self, create: bool) -> &mut Self {
        self.create = create;
        self
    }

    /// Sets the option to always create a new file, failing if it already
    /// exists.
    pub const fn create_new(&mut self, create_new: bool) -> &mut Self {
        self.create_new = create_new;
        self
    }

    /// Sets the size of the read/write buffer. Zero is treated as one.
    pub const fn buffer_capacity(&mut self, capacity: usize) -> &mut Self {
        self.buffer_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Opens the file at `path` with the options specified by `self`.
    ///
    /// When neither write nor append access was requested, the file is
    /// opened for reading.
    ///
    /// # Errors
    ///
    /// This function will return an error under a number of different
    /// circumstances, including but not limited to:
    ///
    /// * [`NotFound`](crate::ErrorKind::NotFound): the specified file does
    ///   not exist and neither `create` nor `create_new` is set.
    /// * [`Io`](crate::ErrorKind::Io): the user lacks permission, `create_new`
    ///   was specified and the file already exists, or the combination of
    ///   options is invalid.
    /// * [`ResourceExhausted`](crate::ErrorKind::ResourceExhausted): the
    ///   buffer could not be allocated.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<BufferedFile> {
        let path = path.as_ref();
        let read = self.read || !(self.write || self.append);
        let file = std::fs::OpenOptions::new()
            .read(read)
            .write(self.write)
            .append(self.append)
            .truncate(self.truncate)
            .create(self.create)
            .create_new(self.create_new)
            .open(path)
            .map_err(Error::from)
            .enrich_with(|| format!("failed to open file {}", path.display()))?;
        Ok(BufferedFile::new(file, self.buffer_capacity)?.with_path(path))
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// An `fopen`-style mode string.
///
/// | Mode | Access | If missing | If present |
/// |------|--------|------------|------------|
/// | `r`  | read | fail | keep |
/// | `w`  | write | create | truncate |
/// | `a`  | append | create | keep |
/// | `r+` | read, write | fail | keep |
/// | `w+` | read, write | create | truncate |
/// | `a+` | read, append | create | keep |
///
/// A `b` may follow the letter or the `+`; it has no effect.
///
/// # Examples
///
/// ```
/// use burrow::OpenMode;
///
/// let mode: OpenMode = "r+b".parse().unwrap();
/// assert_eq!(mode.to_string(), "r+");
/// assert!("x".parse::<OpenMode>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpenMode {
    access: Access,
    update: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Access {
    Read,
    Write,
    Append,
}

impl OpenMode {
    /// Returns the [`OpenOptions`] this mode stands for.
    #[must_use]
    pub fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self.access {
            Access::Read => options.read(true).write(self.update),
            Access::Write => options.read(self.update).write(true).create(true).truncate(true),
            Access::Append => options.read(self.update).append(true).create(true),
        };
        options
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self> {
        let mut chars = mode.chars();
        let access = match chars.next() {
            Some('r') => Access::Read,
            Some('w') => Access::Write,
            Some('a') => Access::Append,
            _ => return Err(Error::invalid_input("invalid file mode")),
        };
        let update = match chars.as_str() {
            "" | "b" => false,
            "+" | "+b" | "b+" => true,
            _ => return Err(Error::invalid_input("invalid file mode")),
        };
        Ok(Self { access, update })
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.access {
            Access::Read => "r",
            Access::Write => "w",
            Access::Append => "a",
        };
        let plus = if self.update { "+" } else { "" };
        write!(f, "{letter}{plus}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parses_modes() {
        for (text, expected) in [("r", "r"), ("rb", "r"), ("w+", "w+"), ("a+b", "a+"), ("wb+", "w+"), ("a", "a")] {
            let mode: OpenMode = text.parse().unwrap();
            assert_eq!(mode.to_string(), expected, "parsing {text}");
        }
    }

    #[test]
    fn rejects_invalid_modes() {
        for text in ["", "x", "rw", "r++", "+r", "r+bb"] {
            let error = text.parse::<OpenMode>().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Io, "parsing {text:?}");
            assert_eq!(
                error.io_error().map(std::io::Error::kind),
                Some(std::io::ErrorKind::InvalidInput)
            );
        }
    }

    #[test]
    fn mode_options() {
        let write: OpenMode = "w".parse().unwrap();
        let mut expected = OpenOptions::new();
        let _ = expected.write(true).create(true).truncate(true);
        assert_eq!(write.options(), expected);

        let update: OpenMode = "r+".parse().unwrap();
        let mut expected = OpenOptions::new();
        let _ = expected.read(true).write(true);
        assert_eq!(update.options(), expected);
    }

    #[test]
    fn zero_buffer_capacity_is_one() {
        let mut options = OpenOptions::new();
        let _ = options.buffer_capacity(0);
        assert_eq!(options.buffer_capacity, 1);
    }

    #[test]
    fn open_defaults_to_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.txt");
        std::fs::write(&path, b"line\n").unwrap();

        let mut file = OpenOptions::new().open(&path).unwrap();
        assert_eq!(file.read_line().unwrap(), Some(b"line".to_vec()));
        assert_eq!(file.to_string(), format!("file ({})", path.display()));
    }

    #[test]
    fn open_missing_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let error = OpenOptions::new().read(true).open(tmp.path().join("missing")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
