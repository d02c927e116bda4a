// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{event, warn, Level};

use crate::buffer::{Buffer, Direction};
use crate::error::{Error, Result};

/// Longest numeral [`BufferedFile::read_number`] will consider.
const MAX_NUMBER_LEN: usize = 200;

/// Reference point for [`BufferedFile::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Whence {
    /// Offset from the start of the file.
    Set,
    /// Offset from the current logical position.
    Cur,
    /// Offset from the end of the file.
    End,
}

/// A file handle with one fixed-capacity buffer used for both read-ahead and
/// write-behind.
///
/// The handle tracks a *logical* position, which is where the application
/// believes it is. Because of buffering, the underlying descriptor's cursor is
/// usually somewhere else; [`seek`](Self::seek) reconciles the two, and reuses
/// the buffered window when the target lands inside it.
///
/// The buffer never grows: reads of lines or numbers longer than the capacity
/// refill it as many times as needed.
///
/// Dropping an open handle flushes pending writes; a failure there is logged,
/// not reported. Call [`close`](Self::close) to observe it.
///
/// # Examples
///
/// ```no_run
/// use burrow::{OpenOptions, Whence};
///
/// # fn example() -> burrow::Result<()> {
/// let mut file = OpenOptions::new().read(true).open("notes.txt")?;
/// let first = file.read_line()?;
/// file.seek(Whence::Set, 0)?;
/// assert_eq!(file.read_line()?, first);
/// # Ok(())
/// # }
/// ```
pub struct BufferedFile<F: Read + Write + Seek = std::fs::File> {
    inner: Option<F>,
    buffer: Buffer,
    path: Option<PathBuf>,
}

impl<F: Read + Write + Seek> BufferedFile<F> {
    /// Wraps `inner`, whose cursor must sit at the position reads and writes
    /// should start from.
    ///
    /// A `capacity` of zero is treated as one.
    ///
    /// # Errors
    ///
    /// Fails with [`ResourceExhausted`](crate::ErrorKind::ResourceExhausted)
    /// if the buffer cannot be allocated.
    pub fn new(inner: F, capacity: usize) -> Result<Self> {
        Ok(Self {
            inner: Some(inner),
            buffer: Buffer::with_capacity(capacity)?,
            path: None,
        })
    }

    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    /// Returns the path the handle was opened from, if it was opened from one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the buffer size in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Returns the wrapped resource.
    ///
    /// Its cursor does not generally match the logical position of this
    /// handle.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::Closed`](crate::ErrorKind::Closed) once closed.
    pub fn get_ref(&self) -> Result<&F> {
        self.inner.as_ref().ok_or_else(|| Error::closed("file"))
    }

    /// Moves the logical position and returns it, measured from the start of
    /// the file.
    ///
    /// Pending writes are flushed first. Offsets relative to [`Whence::Cur`]
    /// are taken from the logical position, not from the descriptor's cursor.
    /// When the new position falls inside the bytes currently buffered the
    /// buffer is kept, so seeking back over data just read does not read it
    /// again.
    ///
    /// # Errors
    ///
    /// A target before the start of the file, or one that does not fit in a
    /// `u64`, is an [`InvalidInput`](std::io::ErrorKind::InvalidInput) error. If the
    /// underlying seek fails, the error is returned and the read-ahead window
    /// is left as it was.
    pub fn seek(&mut self, whence: Whence, offset: i64) -> Result<u64> {
        self.flush_pending()?;
        let inner = open_inner(&mut self.inner)?;

        let end_of_buf = inner.stream_position()?;
        let start_of_buf = end_of_buf.saturating_sub(self.buffer.limit() as u64);

        let target = match whence {
            Whence::Set => SeekFrom::Start(
                u64::try_from(offset).map_err(|_negative| Error::invalid_input("seek before the start of the file"))?,
            ),
            Whence::Cur => {
                let logical = start_of_buf + self.buffer.index() as u64;
                SeekFrom::Start(
                    logical
                        .checked_add_signed(offset)
                        .ok_or_else(|| Error::invalid_input("seek target out of range"))?,
                )
            }
            Whence::End => SeekFrom::End(offset),
        };

        let position = inner.seek(target)?;
        self.reconcile(position, start_of_buf, end_of_buf);
        Ok(position)
    }

    /// Returns the logical position.
    ///
    /// # Errors
    ///
    /// Same as [`seek`](Self::seek).
    pub fn position(&mut self) -> Result<u64> {
        self.seek(Whence::Cur, 0)
    }

    /// Reads the next line, without its terminating newline.
    ///
    /// Returns `None` at end of file. A last line without a newline is still
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed or the read fails.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut any = false;
        loop {
            let available = self.fill()?;
            if available.is_empty() {
                return Ok(any.then_some(line));
            }
            any = true;
            if let Some(newline) = available.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&available[..newline]);
                self.buffer.consume(newline + 1);
                return Ok(Some(line));
            }
            let taken = available.len();
            line.extend_from_slice(available);
            self.buffer.consume(taken);
        }
    }

    /// Skips leading whitespace and reads a decimal number.
    ///
    /// Reading stops after the longest prefix that forms a number, so `1e`
    /// yields `1` and leaves `e` unread. Returns `None`, consuming nothing
    /// past the whitespace, if what follows is not a number.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed or the read fails.
    pub fn read_number(&mut self) -> Result<Option<f64>> {
        while let Some(b) = self.peek()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.buffer.consume(1);
        }

        let mut numeral = Vec::new();
        while numeral.len() < MAX_NUMBER_LEN {
            match self.peek()? {
                Some(b) if continues_numeral(&numeral, b) => {
                    numeral.push(b);
                    self.buffer.consume(1);
                }
                _ => break,
            }
        }

        let (kept, value) = (1..=numeral.len())
            .rev()
            .find_map(|len| parse_numeral(&numeral[..len]).map(|value| (len, value)))
            .map_or((0, None), |(len, value)| (len, Some(value)));

        let unread = numeral.len() - kept;
        if unread > 0 {
            let back = i64::try_from(unread).map_err(|_overflow| Error::invalid_input("numeral too long"))?;
            let _ = self.seek(Whence::Cur, -back)?;
        }
        Ok(value)
    }

    /// Reads up to `count` bytes.
    ///
    /// Returns `None` at end of file. A `count` of zero returns an empty
    /// vector unless the file is at its end, which makes it usable as an
    /// end-of-file probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed or the read fails.
    pub fn read_chars(&mut self, count: usize) -> Result<Option<Vec<u8>>> {
        if count == 0 {
            return Ok(self.peek()?.map(|_| Vec::new()));
        }

        let mut out = Vec::new();
        while out.len() < count {
            let available = self.fill()?;
            if available.is_empty() {
                break;
            }
            let taken = available.len().min(count - out.len());
            out.extend_from_slice(&available[..taken]);
            self.buffer.consume(taken);
        }
        Ok((!out.is_empty()).then_some(out))
    }

    /// Reads everything up to the end of the file. Empty at end of file.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed or the read fails.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let available = self.fill()?;
            if available.is_empty() {
                return Ok(out);
            }
            let taken = available.len();
            out.extend_from_slice(available);
            self.buffer.consume(taken);
        }
    }

    /// Writes `data` at the logical position.
    ///
    /// Bytes collect in the buffer and reach the file when it fills, on
    /// [`flush`](Self::flush), on [`seek`](Self::seek), before the next read,
    /// and on close.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed or writing to the file fails.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        self.begin_write()?;
        let mut rest = data.as_ref();
        while !rest.is_empty() {
            if self.buffer.limit() == 0 && rest.len() >= self.buffer.capacity() {
                open_inner(&mut self.inner)?.write_all(rest)?;
                return Ok(());
            }
            let copied = self.buffer.push(rest);
            rest = &rest[copied..];
            if self.buffer.is_full() {
                self.flush_pending()?;
            }
        }
        Ok(())
    }

    /// Writes pending bytes and flushes the underlying file.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is closed or the file rejects the data.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_pending()?;
        open_inner(&mut self.inner)?.flush()?;
        Ok(())
    }

    /// Flushes and releases the underlying file.
    ///
    /// Closing a closed handle does nothing. Every other operation on a
    /// closed handle fails with [`ErrorKind::Closed`](crate::ErrorKind::Closed).
    ///
    /// # Errors
    ///
    /// Returns the flush error, if any. The handle is closed regardless.
    pub fn close(&mut self) -> Result<()> {
        if self.inner.is_none() {
            return Ok(());
        }
        let flushed = self.flush();
        self.inner = None;
        self.buffer.invalidate();
        flushed
    }

    /// Keeps the buffer in step with the descriptor after a real seek.
    ///
    /// `start_of_buf..=end_of_buf` is the file range the buffer mirrored
    /// before the seek. A position inside it keeps the window; the descriptor
    /// goes back to `end_of_buf` so the window stays anchored there.
    /// Anything else drops the window.
    fn reconcile(&mut self, position: u64, start_of_buf: u64, end_of_buf: u64) {
        if self.buffer.limit() > 0
            && (start_of_buf..=end_of_buf).contains(&position)
            && let Ok(index) = usize::try_from(position - start_of_buf)
            && let Some(inner) = self.inner.as_mut()
            && inner.seek(SeekFrom::Start(end_of_buf)).is_ok()
        {
            self.buffer.reposition(index);
            event!(Level::TRACE, message = "seek kept buffered window", position, start_of_buf, end_of_buf);
            return;
        }

        // A failed restore leaves the descriptor at `position`, which matches
        // an empty window.
        self.buffer.invalidate();
        event!(Level::TRACE, message = "seek dropped buffered window", position);
    }

    /// Returns unconsumed read-ahead, refilling from the file when the
    /// window is used up. Empty at end of file.
    fn fill(&mut self) -> Result<&[u8]> {
        if self.buffer.direction() == Direction::Write {
            self.flush_pending()?;
        }
        let inner = open_inner(&mut self.inner)?;
        if self.buffer.index() == self.buffer.limit() {
            let _ = self.buffer.fill_from(inner)?;
        }
        Ok(self.buffer.available())
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.fill()?.first().copied())
    }

    /// Gives up read-ahead before writing, putting the descriptor back at the
    /// logical position.
    fn begin_write(&mut self) -> Result<()> {
        let inner = open_inner(&mut self.inner)?;
        if self.buffer.direction() == Direction::Read {
            let unread = self.buffer.limit() - self.buffer.index();
            if unread > 0 {
                let back = i64::try_from(unread).map_err(|_overflow| Error::invalid_input("read-ahead too large"))?;
                let _ = inner.seek(SeekFrom::Current(-back))?;
            }
            self.buffer.invalidate();
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<()> {
        if self.buffer.direction() != Direction::Write {
            return Ok(());
        }
        let inner = open_inner(&mut self.inner)?;
        inner.write_all(self.buffer.pending())?;
        self.buffer.invalidate();
        Ok(())
    }
}

fn open_inner<F>(inner: &mut Option<F>) -> Result<&mut F> {
    inner.as_mut().ok_or_else(|| Error::closed("file"))
}

fn parse_numeral(numeral: &[u8]) -> Option<f64> {
    std::str::from_utf8(numeral).ok()?.parse().ok()
}

/// Whether `next` extends the decimal numeral collected so far.
fn continues_numeral(numeral: &[u8], next: u8) -> bool {
    let has_exponent = numeral.iter().any(|b| matches!(b, b'e' | b'E'));
    match next {
        b'0'..=b'9' => true,
        b'+' | b'-' => matches!(numeral.last(), None | Some(b'e' | b'E')),
        b'.' => !has_exponent && !numeral.contains(&b'.'),
        b'e' | b'E' => !has_exponent && numeral.iter().any(u8::is_ascii_digit),
        _ => false,
    }
}

impl<F: Read + Write + Seek> fmt::Display for BufferedFile<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.inner, &self.path) {
            (None, _) => write!(f, "file (closed)"),
            (Some(_), Some(path)) => write!(f, "file ({})", path.display()),
            (Some(_), None) => write!(f, "file (open)"),
        }
    }
}

impl<F: Read + Write + Seek> fmt::Debug for BufferedFile<F> {
    #[cfg_attr(test, mutants::skip)] // Diagnostic output only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedFile")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .field("capacity", &self.buffer.capacity())
            .field("index", &self.buffer.index())
            .field("limit", &self.buffer.limit())
            .finish_non_exhaustive()
    }
}

impl<F: Read + Write + Seek> Drop for BufferedFile<F> {
    fn drop(&mut self) {
        if self.inner.is_some()
            && let Err(error) = self.flush()
        {
            warn!(%error, path = ?self.path, "failed to flush buffered file on drop");
        }
    }
}

impl<F: Read + Write + Seek> Read for BufferedFile<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill()?;
        let taken = available.len().min(buf.len());
        buf[..taken].copy_from_slice(&available[..taken]);
        self.buffer.consume(taken);
        Ok(taken)
    }
}

impl<F: Read + Write + Seek> BufRead for BufferedFile<F> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.fill()?)
    }

    fn consume(&mut self, amount: usize) {
        self.buffer.consume(amount);
    }
}

impl<F: Read + Write + Seek> Write for BufferedFile<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(Self::flush(self)?)
    }
}

impl<F: Read + Write + Seek> Seek for BufferedFile<F> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = match pos {
            SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset).map_err(|_overflow| io::Error::from(io::ErrorKind::InvalidInput))?;
                Self::seek(self, Whence::Set, offset)
            }
            SeekFrom::Current(offset) => Self::seek(self, Whence::Cur, offset),
            SeekFrom::End(offset) => Self::seek(self, Whence::End, offset),
        };
        Ok(position?)
    }
}
