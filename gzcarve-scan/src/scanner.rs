//! Candidate search over the window.
//!
//! The scanner looks for `0x1f`, makes sure a full fixed header is buffered
//! behind it, and runs the header heuristics. A rejected candidate only moves
//! the search one byte forward, so overlapping candidates such as
//! `1f 1f 8b 08 ...` are still found.

use crate::gzip::header::{GZIP_MAGIC, HEADER_LEN};
use crate::heuristic::{HeuristicConfig, unix_now};
use crate::window::Window;
use gzcarve_core::error::Result;
use memchr::memchr;
use std::io::Read;
use tracing::{debug, trace};

/// Where the scanner currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the next `0x1f`.
    Searching,
    /// A candidate straddled the window edge and is being completed.
    HeaderPending,
    /// A candidate was accepted; the window starts at it.
    Found,
    /// Input is exhausted.
    Exhausted,
}

/// Result of one [`Scanner::find_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The window's consumed start now sits on a plausible member header.
    Found,
    /// No further member exists in the input.
    Exhausted,
}

/// Finds plausible gzip member headers in a [`Window`].
#[derive(Debug, Clone)]
pub struct Scanner {
    config: HeuristicConfig,
    state: ScanState,
    clock: Option<u64>,
    rejected: u64,
}

impl Scanner {
    /// Create a scanner with the given heuristics.
    pub fn new(config: HeuristicConfig) -> Self {
        Self {
            config,
            state: ScanState::Searching,
            clock: None,
            rejected: 0,
        }
    }

    /// Judge timestamps against a fixed time instead of the wall clock.
    pub fn with_clock(mut self, now: u64) -> Self {
        self.clock = Some(now);
        self
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Number of candidates rejected so far.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Search from the window's consumed start for the next plausible header.
    ///
    /// On [`ScanOutcome::Found`] the window's consumed start is the first byte
    /// of the header and at least [`HEADER_LEN`] bytes are available.
    pub fn find_next<R: Read>(&mut self, window: &mut Window<R>) -> Result<ScanOutcome> {
        let now = self.clock.unwrap_or_else(unix_now);
        let mut pos = window.start();

        loop {
            self.state = ScanState::Searching;

            if pos >= window.end() {
                if window.refill(None)? == 0 {
                    return Ok(self.exhaust());
                }
                pos = window.start();
            }

            let Some(hit) = memchr(GZIP_MAGIC[0], &window.valid()[pos..]) else {
                pos = window.end();
                continue;
            };
            let mut candidate = pos + hit;

            if candidate + HEADER_LEN > window.end() {
                self.state = ScanState::HeaderPending;
                window.refill(Some(candidate))?;
                candidate = window.start();
                if candidate + HEADER_LEN > window.end() {
                    trace!(
                        offset = window.stream_offset(),
                        "input ends inside a candidate header"
                    );
                    return Ok(self.exhaust());
                }
            }

            let prefix = &window.valid()[candidate..candidate + HEADER_LEN];
            match self.config.check(prefix, now) {
                Ok(()) => {
                    window.set_start(candidate);
                    self.state = ScanState::Found;
                    debug!(offset = window.stream_offset(), "gzip header candidate accepted");
                    return Ok(ScanOutcome::Found);
                }
                Err(reason) => {
                    self.rejected += 1;
                    trace!(?reason, "candidate rejected");
                    pos = candidate + 1;
                }
            }
        }
    }

    fn exhaust(&mut self) -> ScanOutcome {
        self.state = ScanState::Exhausted;
        ScanOutcome::Exhausted
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(HeuristicConfig::STRICT)
    }
}
