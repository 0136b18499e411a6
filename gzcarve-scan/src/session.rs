//! Carving session: enumerate members or extract one of them.
//!
//! A [`Session`] owns the input window and the member decoder for its whole
//! lifetime and lends them to the scanner and the decoder in turn. Members are
//! numbered from 1 in the order the scanner accepts them.

use crate::decoder::{DEFAULT_CHUNK_SIZE, MemberDecoder};
use crate::gzip::GzipHeader;
use crate::gzip::header::DEFAULT_NAME_LIMIT;
use crate::heuristic::HeuristicConfig;
use crate::output::OutputPolicy;
use crate::scanner::{ScanOutcome, Scanner};
use crate::window::{DEFAULT_WINDOW_SIZE, Window};
use filetime::FileTime;
use gzcarve_core::error::{CarveError, Result};
use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Header heuristics.
    pub heuristic: HeuristicConfig,
    /// Window capacity in bytes.
    pub window_size: usize,
    /// Decompressed output chunk size in bytes.
    pub chunk_size: usize,
    /// Embedded name bytes kept per member.
    pub name_limit: usize,
}

impl SessionOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch between the strict and lenient heuristic presets.
    pub fn strict(mut self, strict: bool) -> Self {
        self.heuristic = HeuristicConfig::new(strict);
        self
    }

    /// Use specific heuristics.
    pub fn heuristic(mut self, heuristic: HeuristicConfig) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Set the window capacity.
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the output chunk size.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the embedded name limit.
    pub fn name_limit(mut self, limit: usize) -> Self {
        self.name_limit = limit;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            heuristic: HeuristicConfig::STRICT,
            window_size: DEFAULT_WINDOW_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            name_limit: DEFAULT_NAME_LIMIT,
        }
    }
}

/// A member located by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// 1-based position among accepted members.
    pub ordinal: usize,
    /// Stream offset of the first header byte.
    pub offset: u64,
    /// Captured header.
    pub header: GzipHeader,
}

impl MemberInfo {
    /// The embedded filename, or an empty string.
    pub fn name(&self) -> &str {
        self.header.name()
    }
}

/// The listing line: ordinal, hex offset, name.
impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>2}: {:#010x}  {}", self.ordinal, self.offset, self.name())
    }
}

/// Outcome of a file extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    /// The extracted member.
    pub member: MemberInfo,
    /// Where the payload was written.
    pub path: PathBuf,
    /// Decompressed bytes written.
    pub bytes_written: u64,
}

/// A carving session over one input.
pub struct Session<R> {
    window: Window<R>,
    scanner: Scanner,
    decoder: MemberDecoder,
    found: usize,
}

impl<R: Read> Session<R> {
    /// Create a session with default options.
    pub fn new(source: R) -> Self {
        let options = SessionOptions::default();
        Self {
            window: Window::new(source),
            scanner: Scanner::new(options.heuristic),
            decoder: MemberDecoder::new(options.name_limit, options.chunk_size),
            found: 0,
        }
    }

    /// Create a session with specific options.
    pub fn with_options(source: R, options: SessionOptions) -> Result<Self> {
        if options.chunk_size == 0 {
            return Err(CarveError::invalid_config("chunk size must be positive"));
        }
        if options.name_limit == 0 {
            return Err(CarveError::invalid_config("name limit must be positive"));
        }

        Ok(Self {
            window: Window::with_capacity(source, options.window_size)?,
            scanner: Scanner::new(options.heuristic),
            decoder: MemberDecoder::new(options.name_limit, options.chunk_size),
            found: 0,
        })
    }

    /// Judge header timestamps against a fixed time instead of the wall clock.
    pub fn with_clock(mut self, now: u64) -> Self {
        self.scanner = self.scanner.with_clock(now);
        self
    }

    /// Members accepted so far.
    pub fn found(&self) -> usize {
        self.found
    }

    /// The scanner, for statistics.
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Enumerate every member, calling `on_member` as each one is found.
    ///
    /// Only headers are parsed; payloads are skipped over by the scanner.
    /// Returns the number of members, or [`CarveError::NoDataFound`].
    pub fn list_with<F>(&mut self, mut on_member: F) -> Result<usize>
    where
        F: FnMut(&MemberInfo),
    {
        while self.scanner.find_next(&mut self.window)? == ScanOutcome::Found {
            let member = self.parse_member()?;
            on_member(&member);
        }

        debug!(
            found = self.found,
            rejected = self.scanner.rejected(),
            "input exhausted"
        );
        if self.found == 0 {
            return Err(CarveError::NoDataFound);
        }
        Ok(self.found)
    }

    /// Enumerate every member into a vector.
    pub fn list(&mut self) -> Result<Vec<MemberInfo>> {
        let mut members = Vec::new();
        self.list_with(|member| members.push(member.clone()))?;
        Ok(members)
    }

    /// Skip forward to member `ordinal` and parse its header.
    ///
    /// Members before it are passed over one byte past their header start,
    /// without decoding.
    pub fn select(&mut self, ordinal: usize) -> Result<MemberInfo> {
        if ordinal == 0 {
            return Err(CarveError::invalid_config("member ordinals start at 1"));
        }
        if ordinal <= self.found {
            return Err(CarveError::invalid_config(format!(
                "member {} was already passed",
                ordinal
            )));
        }

        loop {
            if self.scanner.find_next(&mut self.window)? == ScanOutcome::Exhausted {
                debug!(found = self.found, "input exhausted before target member");
                return Err(if self.found == 0 {
                    CarveError::NoDataFound
                } else {
                    CarveError::ordinal_out_of_range(ordinal, self.found)
                });
            }

            if self.found + 1 == ordinal {
                return self.parse_member();
            }
            self.found += 1;
            self.window.consume(1);
        }
    }

    /// Decode the payload of the member returned by the last
    /// [`select`](Self::select) into `sink`.
    pub fn decode_selected<W, F>(&mut self, sink: &mut W, progress: F) -> Result<u64>
    where
        W: Write,
        F: FnMut(u64),
    {
        self.decoder.decode_payload(&mut self.window, sink, progress)
    }

    /// Extract member `ordinal` into any writer.
    pub fn extract_to_writer<W: Write>(
        &mut self,
        ordinal: usize,
        sink: &mut W,
    ) -> Result<(MemberInfo, u64)> {
        let member = self.select(ordinal)?;
        let written = self.decode_selected(sink, |_| {})?;
        Ok((member, written))
    }

    /// Extract member `ordinal` to a file chosen by `policy`.
    ///
    /// The output file is only created once the member has been located and
    /// its header parsed. It is closed even when decoding fails.
    pub fn extract<F>(
        &mut self,
        ordinal: usize,
        policy: &OutputPolicy,
        progress: F,
    ) -> Result<ExtractReport>
    where
        F: FnMut(u64),
    {
        let member = self.select(ordinal)?;
        let path = policy.resolve(member.name());
        let mut file = policy.open(&path)?;
        debug!(path = %path.display(), "output opened");

        let decoded = self.decode_selected(&mut file, progress);
        let closed = file.sync_all().map_err(CarveError::write);
        drop(file);
        let bytes_written = decoded?;
        closed?;

        if policy.restore_mtime && member.header.mtime != 0 {
            let mtime = FileTime::from_unix_time(i64::from(member.header.mtime), 0);
            filetime::set_file_mtime(&path, mtime).map_err(CarveError::write)?;
        }

        info!(
            ordinal,
            offset = member.offset,
            bytes = bytes_written,
            path = %path.display(),
            "member extracted"
        );
        Ok(ExtractReport {
            member,
            path,
            bytes_written,
        })
    }

    /// Count the scanner match at the window start and parse its header.
    fn parse_member(&mut self) -> Result<MemberInfo> {
        self.found += 1;
        let offset = self.window.stream_offset();
        let header = self.decoder.init_member(&mut self.window)?;
        Ok(MemberInfo {
            ordinal: self.found,
            offset,
            header,
        })
    }
}
