//! Header heuristics for telling real gzip members from stray `0x1f` bytes.
//!
//! Only the fixed 10-byte prefix of a member header is examined. The strict
//! preset additionally constrains the modification time and the OS byte,
//! trading recall for precision on noisy or binary-heavy input.

use crate::gzip::header::{CM_DEFLATE, GZIP_MAGIC, HEADER_LEN, flags};
use std::time::{SystemTime, UNIX_EPOCH};

/// 1990-01-01T00:00:00Z, shortly before gzip existed.
pub const EARLIEST_MTIME: u32 = 631_170_000;

/// Roughly one year, tolerated as clock skew past the current time.
pub const APPROX_YEAR_SECS: u64 = 31_556_926;

/// Highest OS code in the gzip OS registry (13 = Acorn RISCOS).
pub const OS_MAX_KNOWN: u8 = 13;

/// OS code meaning "unknown".
pub const OS_UNKNOWN: u8 = 255;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Fewer than [`HEADER_LEN`] bytes were supplied.
    Short,
    /// Second magic byte is not `0x8b`.
    Magic,
    /// Compression method is not DEFLATE.
    Method,
    /// One of the reserved flag bits is set.
    ReservedFlags,
    /// Modification time is implausible.
    Mtime,
    /// Extra flags are not 0, 2 or 4.
    ExtraFlags,
    /// OS byte is outside the registry.
    Os,
}

/// Header heuristic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicConfig {
    /// Check the modification time and the OS byte.
    pub strict: bool,
    /// Earliest accepted non-zero modification time.
    pub earliest_mtime: u32,
    /// How far past the current time a modification time may lie.
    pub future_skew_secs: u64,
    /// Highest accepted OS code (besides `os_unknown`).
    pub os_max: u8,
    /// The OS code that marks an unknown system.
    pub os_unknown: u8,
}

impl HeuristicConfig {
    /// Strict checking: structural fields, timestamp and OS registry.
    pub const STRICT: Self = Self {
        strict: true,
        earliest_mtime: EARLIEST_MTIME,
        future_skew_secs: APPROX_YEAR_SECS,
        os_max: OS_MAX_KNOWN,
        os_unknown: OS_UNKNOWN,
    };

    /// Lenient checking: only the structurally required fields.
    pub const LENIENT: Self = Self {
        strict: false,
        ..Self::STRICT
    };

    /// Pick a preset.
    pub fn new(strict: bool) -> Self {
        if strict { Self::STRICT } else { Self::LENIENT }
    }

    /// Check a candidate whose first byte is already known to be `0x1f`.
    ///
    /// `now` is the current time in seconds since the Unix epoch.
    pub fn check(&self, bytes: &[u8], now: u64) -> Result<(), Rejection> {
        if bytes.len() < HEADER_LEN {
            return Err(Rejection::Short);
        }
        if bytes[1] != GZIP_MAGIC[1] {
            return Err(Rejection::Magic);
        }
        if bytes[2] != CM_DEFLATE {
            return Err(Rejection::Method);
        }
        if bytes[3] & flags::RESERVED != 0 {
            return Err(Rejection::ReservedFlags);
        }

        if self.strict {
            let mtime = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
            if !self.accepts_mtime(mtime, now) {
                return Err(Rejection::Mtime);
            }
        }

        if !matches!(bytes[8], 0 | 2 | 4) {
            return Err(Rejection::ExtraFlags);
        }

        if self.strict && !self.accepts_os(bytes[9]) {
            return Err(Rejection::Os);
        }

        Ok(())
    }

    /// Zero (unset) or within `[earliest_mtime, now + future_skew_secs]`.
    pub fn accepts_mtime(&self, mtime: u32, now: u64) -> bool {
        mtime == 0
            || (mtime >= self.earliest_mtime
                && u64::from(mtime) <= now.saturating_add(self.future_skew_secs))
    }

    /// Inside the OS registry, or explicitly unknown.
    pub fn accepts_os(&self, os: u8) -> bool {
        os <= self.os_max || os == self.os_unknown
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self::STRICT
    }
}

/// Seconds since the Unix epoch, or zero if the clock is before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
