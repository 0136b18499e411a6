//! GZIP header parsing (RFC 1952).
//!
//! Headers arrive in whatever pieces the window hands over, so parsing is an
//! incremental state machine rather than a blocking read.

use flate2::Crc;
use gzcarve_core::error::{CarveError, DecodeErrorKind, Result};
use memchr::memchr;

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Length of the fixed header prefix.
pub const HEADER_LEN: usize = 10;

/// Default number of embedded name bytes kept.
pub const DEFAULT_NAME_LIMIT: usize = 29;

/// Number of comment bytes kept.
pub const COMMENT_LIMIT: usize = 1024;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// Captured GZIP member header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GzipHeader {
    /// Flags.
    pub flags: u8,
    /// Modification time (Unix timestamp, 0 if unset).
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
    /// Length of the extra field (if FEXTRA flag set).
    pub extra_len: Option<u16>,
    /// Original filename (if FNAME flag set), cut to the name limit.
    pub filename: Option<String>,
    /// Comment (if FCOMMENT flag set), cut to [`COMMENT_LIMIT`].
    pub comment: Option<String>,
    /// Header CRC16 (if FHCRC flag set).
    pub header_crc: Option<u16>,
    /// Whether the filename was longer than the name limit.
    pub name_truncated: bool,
}

impl GzipHeader {
    /// The embedded filename, or an empty string.
    pub fn name(&self) -> &str {
        self.filename.as_deref().unwrap_or("")
    }

    /// Name of the operating system code.
    pub fn os_name(&self) -> &'static str {
        match self.os {
            0 => "FAT",
            1 => "Amiga",
            2 => "VMS",
            3 => "Unix",
            4 => "VM/CMS",
            5 => "Atari TOS",
            6 => "HPFS",
            7 => "Macintosh",
            8 => "Z-System",
            9 => "CP/M",
            10 => "TOPS-20",
            11 => "NTFS",
            12 => "QDOS",
            13 => "Acorn RISCOS",
            _ => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Fixed,
    ExtraLen,
    Extra { remaining: usize },
    Name,
    Comment,
    HeaderCrc,
    Done,
}

/// Incremental GZIP header parser.
pub struct HeaderParser {
    field: Field,
    scratch: [u8; HEADER_LEN],
    filled: usize,
    crc: Crc,
    name: Vec<u8>,
    comment: Vec<u8>,
    name_limit: usize,
    header: GzipHeader,
}

impl HeaderParser {
    /// Create a parser keeping at most `name_limit` filename bytes.
    pub fn new(name_limit: usize) -> Self {
        Self {
            field: Field::Fixed,
            scratch: [0; HEADER_LEN],
            filled: 0,
            crc: Crc::new(),
            name: Vec::new(),
            comment: Vec::new(),
            name_limit,
            header: GzipHeader::default(),
        }
    }

    /// Start over for a new member.
    pub fn reset(&mut self) {
        self.field = Field::Fixed;
        self.filled = 0;
        self.crc.reset();
        self.name.clear();
        self.comment.clear();
        self.header = GzipHeader::default();
    }

    /// Change the filename limit for the next header.
    pub fn set_name_limit(&mut self, name_limit: usize) {
        self.name_limit = name_limit;
    }

    /// Check if the whole header has been parsed.
    pub fn is_done(&self) -> bool {
        self.field == Field::Done
    }

    /// The parsed header, once complete.
    pub fn header(&self) -> Option<&GzipHeader> {
        self.is_done().then_some(&self.header)
    }

    /// Feed header bytes. Returns how many were consumed; parsing stops at the
    /// end of the header, leaving the payload unconsumed.
    pub fn feed(&mut self, input: &[u8]) -> Result<usize> {
        let mut pos = 0;

        while pos < input.len() {
            let rest = &input[pos..];
            match self.field {
                Field::Fixed => {
                    pos += self.fill(rest, HEADER_LEN, true);
                    if self.filled == HEADER_LEN {
                        self.parse_fixed()?;
                    }
                }
                Field::ExtraLen => {
                    pos += self.fill(rest, 2, true);
                    if self.filled == 2 {
                        let len = u16::from_le_bytes([self.scratch[0], self.scratch[1]]);
                        self.header.extra_len = Some(len);
                        self.filled = 0;
                        if len == 0 {
                            self.advance();
                        } else {
                            self.field = Field::Extra {
                                remaining: len as usize,
                            };
                        }
                    }
                }
                Field::Extra { remaining } => {
                    let take = remaining.min(rest.len());
                    self.crc.update(&rest[..take]);
                    pos += take;
                    if take == remaining {
                        self.advance();
                    } else {
                        self.field = Field::Extra {
                            remaining: remaining - take,
                        };
                    }
                }
                Field::Name | Field::Comment => {
                    let (used, terminated) = match memchr(0, rest) {
                        Some(i) => (i + 1, true),
                        None => (rest.len(), false),
                    };
                    let text = &rest[..used - usize::from(terminated)];
                    self.crc.update(&rest[..used]);
                    pos += used;

                    if self.field == Field::Name {
                        let room = self.name_limit.saturating_sub(self.name.len());
                        if text.len() > room {
                            self.header.name_truncated = true;
                        }
                        self.name.extend_from_slice(&text[..text.len().min(room)]);
                    } else {
                        let room = COMMENT_LIMIT.saturating_sub(self.comment.len());
                        self.comment.extend_from_slice(&text[..text.len().min(room)]);
                    }

                    if terminated {
                        self.finish_string();
                        self.advance();
                    }
                }
                Field::HeaderCrc => {
                    pos += self.fill(rest, 2, false);
                    if self.filled == 2 {
                        let stored = u16::from_le_bytes([self.scratch[0], self.scratch[1]]);
                        if stored != (self.crc.sum() & 0xFFFF) as u16 {
                            return Err(CarveError::decode(
                                DecodeErrorKind::Header,
                                "header crc mismatch",
                            ));
                        }
                        self.header.header_crc = Some(stored);
                        self.advance();
                    }
                }
                Field::Done => break,
            }
        }

        Ok(pos)
    }

    /// Copy up to `want - filled` bytes into the scratch buffer.
    fn fill(&mut self, input: &[u8], want: usize, hash: bool) -> usize {
        let take = (want - self.filled).min(input.len());
        self.scratch[self.filled..self.filled + take].copy_from_slice(&input[..take]);
        if hash {
            self.crc.update(&input[..take]);
        }
        self.filled += take;
        take
    }

    fn parse_fixed(&mut self) -> Result<()> {
        let buf = self.scratch;

        if buf[0..2] != GZIP_MAGIC {
            return Err(CarveError::decode(
                DecodeErrorKind::Header,
                "incorrect header check",
            ));
        }
        if buf[2] != CM_DEFLATE {
            return Err(CarveError::decode(
                DecodeErrorKind::Header,
                format!("unknown compression method {}", buf[2]),
            ));
        }
        if buf[3] & flags::RESERVED != 0 {
            return Err(CarveError::decode(
                DecodeErrorKind::Header,
                "unknown header flags set",
            ));
        }

        self.header.flags = buf[3];
        self.header.mtime = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        self.header.xfl = buf[8];
        self.header.os = buf[9];
        self.advance();
        Ok(())
    }

    fn finish_string(&mut self) {
        if self.field == Field::Name {
            self.header.filename = Some(String::from_utf8_lossy(&self.name).into_owned());
        } else {
            self.header.comment = Some(String::from_utf8_lossy(&self.comment).into_owned());
        }
    }

    /// Move to the next optional field the flags announce.
    fn advance(&mut self) {
        let f = self.header.flags;
        self.filled = 0;
        self.field = match self.field {
            Field::HeaderCrc | Field::Done => Field::Done,
            Field::Fixed if f & flags::FEXTRA != 0 => Field::ExtraLen,
            Field::Fixed | Field::ExtraLen | Field::Extra { .. } if f & flags::FNAME != 0 => {
                Field::Name
            }
            Field::Fixed | Field::ExtraLen | Field::Extra { .. } | Field::Name
                if f & flags::FCOMMENT != 0 =>
            {
                Field::Comment
            }
            _ if f & flags::FHCRC != 0 => Field::HeaderCrc,
            _ => Field::Done,
        };
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a header by hand, optionally with every optional field.
    fn raw_header(flag_bits: u8, name: &[u8], comment: &[u8], extra: &[u8]) -> Vec<u8> {
        let mut out = vec![0x1F, 0x8B, 0x08, flag_bits, 0x00, 0x5E, 0x0B, 0x61, 0x00, 0x03];
        if flag_bits & flags::FEXTRA != 0 {
            out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            out.extend_from_slice(extra);
        }
        if flag_bits & flags::FNAME != 0 {
            out.extend_from_slice(name);
            out.push(0);
        }
        if flag_bits & flags::FCOMMENT != 0 {
            out.extend_from_slice(comment);
            out.push(0);
        }
        if flag_bits & flags::FHCRC != 0 {
            let mut crc = Crc::new();
            crc.update(&out);
            out.extend_from_slice(&((crc.sum() & 0xFFFF) as u16).to_le_bytes());
        }
        out
    }

    #[test]
    fn test_fixed_only() {
        let raw = raw_header(0, b"", b"", b"");
        let mut parser = HeaderParser::default();
        let mut input = raw.clone();
        input.extend_from_slice(b"payload");

        assert_eq!(parser.feed(&input).unwrap(), HEADER_LEN);
        let header = parser.header().unwrap();
        assert_eq!(header.mtime, 0x610B_5E00);
        assert_eq!(header.os, 3);
        assert_eq!(header.name(), "");
        assert_eq!(header.os_name(), "Unix");
    }

    #[test]
    fn test_all_fields_byte_by_byte() {
        let all = flags::FEXTRA | flags::FNAME | flags::FCOMMENT | flags::FHCRC;
        let raw = raw_header(all, b"notes.txt", b"made by hand", b"AB\x04\x00abcd");
        let mut parser = HeaderParser::default();

        let mut consumed = 0;
        for byte in raw.chunks(1) {
            assert!(!parser.is_done());
            consumed += parser.feed(byte).unwrap();
        }
        assert_eq!(consumed, raw.len());

        let header = parser.header().unwrap();
        assert_eq!(header.extra_len, Some(8));
        assert_eq!(header.name(), "notes.txt");
        assert_eq!(header.comment.as_deref(), Some("made by hand"));
        assert!(header.header_crc.is_some());
        assert!(!header.name_truncated);

        // Nothing past the header is taken.
        assert_eq!(parser.feed(b"more").unwrap(), 0);
    }

    #[test]
    fn test_name_is_cut_to_limit() {
        let raw = raw_header(flags::FNAME, b"a-rather-long-file-name.tar", b"", b"");
        let mut parser = HeaderParser::new(8);
        parser.feed(&raw).unwrap();
        let header = parser.header().unwrap();
        assert_eq!(header.name(), "a-rather");
        assert!(header.name_truncated);
    }

    #[test]
    fn test_empty_extra_field() {
        let raw = raw_header(flags::FEXTRA | flags::FNAME, b"x", b"", b"");
        let mut parser = HeaderParser::default();
        assert_eq!(parser.feed(&raw).unwrap(), raw.len());
        assert_eq!(parser.header().unwrap().extra_len, Some(0));
        assert_eq!(parser.header().unwrap().name(), "x");
    }

    #[test]
    fn test_header_crc_mismatch() {
        let mut raw = raw_header(flags::FNAME | flags::FHCRC, b"x", b"", b"");
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let mut parser = HeaderParser::default();
        let err = parser.feed(&raw).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::Header));
        assert!(err.to_string().contains("header crc mismatch"));
    }

    #[test]
    fn test_bad_method() {
        let mut raw = raw_header(0, b"", b"", b"");
        raw[2] = 7;
        let mut parser = HeaderParser::default();
        let err = parser.feed(&raw).unwrap_err();
        assert!(err.to_string().contains("unknown compression method 7"));
    }

    #[test]
    fn test_reset_reuses_parser() {
        let mut parser = HeaderParser::default();
        parser
            .feed(&raw_header(flags::FNAME, b"first", b"", b""))
            .unwrap();
        assert_eq!(parser.header().unwrap().name(), "first");

        parser.reset();
        assert!(parser.header().is_none());
        parser.feed(&raw_header(0, b"", b"", b"")).unwrap();
        assert_eq!(parser.header().unwrap().filename, None);
    }
}
