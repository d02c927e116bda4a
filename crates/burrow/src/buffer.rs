// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{self, Read};

use crate::error::{Error, Result};

/// What the bytes currently held by a [`Buffer`] mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Nothing buffered.
    Idle,
    /// Read-ahead: `[index, limit)` has not been consumed yet.
    Read,
    /// Write-behind: `[0, limit)` has not reached the file yet.
    Write,
}

/// A fixed-capacity window over a contiguous range of a file.
///
/// For read-ahead, `limit` bytes were read from the file and `index` of them
/// have been handed out. For write-behind, `limit` bytes are pending and
/// `index == limit`. The capacity never changes after construction.
#[derive(Debug)]
pub(crate) struct Buffer {
    data: Box<[u8]>,
    index: usize,
    limit: usize,
    direction: Direction,
}

impl Buffer {
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_reserve| Error::out_of_memory("file buffer"))?;
        data.resize(capacity, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            index: 0,
            limit: 0,
            direction: Direction::Idle,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Unconsumed read-ahead bytes.
    pub fn available(&self) -> &[u8] {
        match self.direction {
            Direction::Read => &self.data[self.index..self.limit],
            Direction::Idle | Direction::Write => &[],
        }
    }

    /// Bytes written by the application but not yet by the file.
    pub fn pending(&self) -> &[u8] {
        match self.direction {
            Direction::Write => &self.data[..self.limit],
            Direction::Idle | Direction::Read => &[],
        }
    }

    pub fn consume(&mut self, amount: usize) {
        self.index = (self.index + amount).min(self.limit);
    }

    /// Moves the cursor inside the current window.
    pub fn reposition(&mut self, index: usize) {
        debug_assert!(index <= self.limit);
        self.index = index.min(self.limit);
    }

    /// Forgets the window; the next access goes to the file.
    pub fn invalidate(&mut self) {
        self.index = 0;
        self.limit = 0;
        self.direction = Direction::Idle;
    }

    /// Replaces the window with one read from `reader`.
    ///
    /// Only called once the previous window has been consumed. Returns the
    /// number of bytes read; zero means end of file.
    pub fn fill_from(&mut self, reader: &mut impl Read) -> io::Result<usize> {
        debug_assert_eq!(self.index, self.limit);
        self.invalidate();
        let read = loop {
            match reader.read(&mut self.data) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                other => break other?,
            }
        };
        self.limit = read;
        self.direction = Direction::Read;
        Ok(read)
    }

    /// Appends as much of `bytes` as fits and returns how much that was.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        debug_assert_ne!(self.direction, Direction::Read);
        let copied = bytes.len().min(self.capacity() - self.limit);
        self.data[self.limit..self.limit + copied].copy_from_slice(&bytes[..copied]);
        self.limit += copied;
        self.index = self.limit;
        if self.limit > 0 {
            self.direction = Direction::Write;
        }
        copied
    }

    pub fn is_full(&self) -> bool {
        self.limit == self.capacity()
    }
}
