//! Fixed-capacity window over a sequential input source.
//!
//! The window holds the bytes that have been read from the source but not yet
//! consumed by the scanner or the member decoder. `start..end` is the valid,
//! unconsumed range; everything before `start` is dead and may be overwritten
//! by the next refill.

use gzcarve_core::error::{CarveError, Result};
use std::io::{self, Read};
use tracing::trace;

/// Default window capacity in bytes.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Smallest accepted window capacity.
///
/// A fixed gzip header must always fit with room to read past it.
pub const MIN_WINDOW_SIZE: usize = 32;

/// A sliding byte window backed by a [`Read`] source.
#[derive(Debug)]
pub struct Window<R> {
    source: R,
    buf: Box<[u8]>,
    start: usize,
    end: usize,
    bytes_read: u64,
}

impl<R: Read> Window<R> {
    /// Create a window with the default capacity.
    pub fn new(source: R) -> Self {
        Self {
            source,
            buf: vec![0u8; DEFAULT_WINDOW_SIZE].into_boxed_slice(),
            start: 0,
            end: 0,
            bytes_read: 0,
        }
    }

    /// Create a window with a specific capacity.
    pub fn with_capacity(source: R, capacity: usize) -> Result<Self> {
        if capacity < MIN_WINDOW_SIZE {
            return Err(CarveError::invalid_config(format!(
                "window size {} is below the minimum of {}",
                capacity, MIN_WINDOW_SIZE
            )));
        }

        Ok(Self {
            source,
            buf: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
            bytes_read: 0,
        })
    }

    /// Refill the window from the source.
    ///
    /// With `keep_from`, the bytes `keep_from..end` are moved to the start of
    /// the buffer before reading, so a position `p >= keep_from` is found at
    /// `p - keep_from` afterwards. Without it, all buffered bytes are dropped.
    ///
    /// Returns the number of newly read bytes; zero means end of input.
    pub fn refill(&mut self, keep_from: Option<usize>) -> Result<usize> {
        let keep = match keep_from {
            Some(pos) => {
                let pos = pos.min(self.end);
                self.buf.copy_within(pos..self.end, 0);
                self.end - pos
            }
            None => 0,
        };
        self.start = 0;
        self.end = keep;

        let mut read = 0;
        while self.end < self.buf.len() {
            match self.source.read(&mut self.buf[self.end..]) {
                Ok(0) => break,
                Ok(n) => {
                    self.end += n;
                    self.bytes_read += n as u64;
                    read += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CarveError::read(e)),
            }
        }

        trace!(keep, read, total = self.bytes_read, "window refilled");
        Ok(read)
    }
}

impl<R> Window<R> {
    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Index of the first unconsumed byte.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Index one past the last valid byte.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if every valid byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The unconsumed bytes.
    pub fn available(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// All valid bytes, including consumed ones, indexed like [`start`](Self::start).
    pub fn valid(&self) -> &[u8] {
        &self.buf[..self.end]
    }

    /// Mark `n` more bytes as consumed.
    pub fn consume(&mut self, n: usize) {
        self.start = (self.start + n).min(self.end);
    }

    /// Move the consumption boundary to an absolute index.
    pub fn set_start(&mut self, pos: usize) {
        self.start = pos.min(self.end);
    }

    /// Total bytes read from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Stream offset of the first unconsumed byte.
    pub fn stream_offset(&self) -> u64 {
        self.bytes_read - self.len() as u64
    }
}
