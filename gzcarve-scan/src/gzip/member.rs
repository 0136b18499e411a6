//! Streaming decoder for a single GZIP member.
//!
//! Header and trailer framing are handled here; the DEFLATE body is delegated
//! to `flate2` in raw mode.

use super::header::{DEFAULT_NAME_LIMIT, GzipHeader, HeaderParser};
use flate2::{Crc, Decompress, FlushDecompress, Status};
use gzcarve_core::error::{CarveError, DecodeErrorKind, Result};
use gzcarve_core::traits::{DecodeMode, DecodeStatus, StreamDecoder};

/// Length of the CRC-32 + ISIZE trailer.
pub const TRAILER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    Body,
    Trailer,
    Done,
}

/// Decoder for one gzip member at a time, reusable through [`StreamDecoder::reset`].
pub struct GzipMemberDecoder {
    stage: Stage,
    header: HeaderParser,
    inflate: Decompress,
    crc: Crc,
    trailer: [u8; TRAILER_LEN],
    trailer_filled: usize,
}

impl GzipMemberDecoder {
    /// Create a decoder in its initial state.
    pub fn new() -> Self {
        Self {
            stage: Stage::Header,
            header: HeaderParser::new(DEFAULT_NAME_LIMIT),
            inflate: Decompress::new(false),
            crc: Crc::new(),
            trailer: [0; TRAILER_LEN],
            trailer_filled: 0,
        }
    }

    /// Decompressed bytes produced for the current member.
    pub fn total_out(&self) -> u64 {
        self.inflate.total_out()
    }

    /// Run the DEFLATE engine once. Returns (consumed, produced, stream end).
    fn inflate_step(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize, bool)> {
        let before_in = self.inflate.total_in();
        let before_out = self.inflate.total_out();

        let status = self
            .inflate
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| {
                CarveError::decode(
                    DecodeErrorKind::Data,
                    e.message().unwrap_or("invalid deflate data"),
                )
            })?;

        let consumed = (self.inflate.total_in() - before_in) as usize;
        let produced = (self.inflate.total_out() - before_out) as usize;
        self.crc.update(&output[..produced]);

        Ok((consumed, produced, status == Status::StreamEnd))
    }

    fn check_trailer(&self) -> Result<()> {
        let t = &self.trailer;
        let expected_crc = u32::from_le_bytes([t[0], t[1], t[2], t[3]]);
        let expected_size = u32::from_le_bytes([t[4], t[5], t[6], t[7]]);

        if self.crc.sum() != expected_crc {
            return Err(CarveError::decode(
                DecodeErrorKind::Checksum,
                format!(
                    "incorrect data check: expected {:#010x}, computed {:#010x}",
                    expected_crc,
                    self.crc.sum()
                ),
            ));
        }
        // ISIZE is the length modulo 2^32.
        if self.crc.amount() != expected_size {
            return Err(CarveError::decode(
                DecodeErrorKind::Checksum,
                format!(
                    "incorrect length check: expected {}, got {}",
                    expected_size,
                    self.crc.amount()
                ),
            ));
        }
        Ok(())
    }
}

impl Default for GzipMemberDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder for GzipMemberDecoder {
    type Header = GzipHeader;

    fn reset(&mut self) {
        self.stage = Stage::Header;
        self.header.reset();
        self.inflate.reset(false);
        self.crc.reset();
        self.trailer_filled = 0;
    }

    fn request_header(&mut self, name_limit: usize) {
        self.header.set_name_limit(name_limit);
    }

    fn decode(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        mode: DecodeMode,
    ) -> Result<(usize, usize, DecodeStatus)> {
        let mut consumed = 0;
        let mut produced = 0;

        loop {
            match self.stage {
                Stage::Header => {
                    consumed += self.header.feed(&input[consumed..])?;
                    if !self.header.is_done() {
                        return Ok((consumed, produced, DecodeStatus::NeedsInput));
                    }
                    self.stage = Stage::Body;
                    if mode == DecodeMode::HeaderOnly {
                        return Ok((consumed, produced, DecodeStatus::HeaderEnd));
                    }
                }
                Stage::Body => {
                    if produced == output.len() {
                        return Ok((consumed, produced, DecodeStatus::NeedsOutput));
                    }
                    let (used, wrote, end) =
                        self.inflate_step(&input[consumed..], &mut output[produced..])?;
                    consumed += used;
                    produced += wrote;

                    if end {
                        self.stage = Stage::Trailer;
                    } else if used == 0 && wrote == 0 {
                        return Ok((consumed, produced, DecodeStatus::NeedsInput));
                    }
                }
                Stage::Trailer => {
                    let rest = &input[consumed..];
                    let take = (TRAILER_LEN - self.trailer_filled).min(rest.len());
                    self.trailer[self.trailer_filled..self.trailer_filled + take]
                        .copy_from_slice(&rest[..take]);
                    self.trailer_filled += take;
                    consumed += take;

                    if self.trailer_filled < TRAILER_LEN {
                        return Ok((consumed, produced, DecodeStatus::NeedsInput));
                    }
                    self.check_trailer()?;
                    self.stage = Stage::Done;
                }
                Stage::Done => return Ok((consumed, produced, DecodeStatus::MemberEnd)),
            }
        }
    }

    fn header(&self) -> Option<&GzipHeader> {
        self.header.header()
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compression, GzBuilder};
    use std::io::Write;

    fn gzip(data: &[u8], name: Option<&str>) -> Vec<u8> {
        let mut builder = GzBuilder::new();
        if let Some(name) = name {
            builder = builder.filename(name);
        }
        let mut encoder = builder.write(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Drive the decoder with fixed-size input and output pieces.
    fn decode_in_pieces(
        decoder: &mut GzipMemberDecoder,
        member: &[u8],
        in_step: usize,
        out_step: usize,
    ) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut buf = vec![0u8; out_step];
        let mut pos = 0;
        let mut limit = in_step.min(member.len());

        loop {
            let (used, wrote, status) =
                decoder.decode(&member[pos..limit], &mut buf, DecodeMode::Full)?;
            pos += used;
            output.extend_from_slice(&buf[..wrote]);
            match status {
                DecodeStatus::MemberEnd => return Ok(output),
                DecodeStatus::NeedsInput => {
                    assert!(limit < member.len(), "decoder starved");
                    limit = (limit + in_step).min(member.len());
                }
                DecodeStatus::NeedsOutput | DecodeStatus::HeaderEnd => {}
            }
        }
    }

    #[test]
    fn test_decode_whole_member() {
        let data = b"Hello, GZIP World! This is a test of carving.".repeat(20);
        let member = gzip(&data, Some("hello.txt"));

        let mut decoder = GzipMemberDecoder::new();
        let mut out = vec![0u8; data.len() + 16];
        let (used, wrote, status) = decoder
            .decode(&member, &mut out, DecodeMode::Full)
            .unwrap();

        assert_eq!(status, DecodeStatus::MemberEnd);
        assert_eq!(used, member.len());
        assert_eq!(&out[..wrote], &data[..]);
        assert_eq!(decoder.header().unwrap().name(), "hello.txt");
        assert!(decoder.is_finished());
        assert_eq!(decoder.total_out(), data.len() as u64);
    }

    #[test]
    fn test_header_only_stops_before_payload() {
        let member = gzip(b"payload bytes", Some("p.bin"));
        let mut decoder = GzipMemberDecoder::new();
        let (used, wrote, status) = decoder
            .decode(&member, &mut [], DecodeMode::HeaderOnly)
            .unwrap();

        assert_eq!(status, DecodeStatus::HeaderEnd);
        assert_eq!(used, 10 + "p.bin".len() + 1);
        assert_eq!(wrote, 0);
        assert_eq!(decoder.header().unwrap().name(), "p.bin");
    }

    #[test]
    fn test_tiny_pieces() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 251) as u8).collect();
        let member = gzip(&data, None);
        let mut decoder = GzipMemberDecoder::new();
        let out = decode_in_pieces(&mut decoder, &member, 3, 7).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_reset_between_members() {
        let first = gzip(b"first member", Some("one"));
        let second = gzip(b"second member", Some("two"));
        let mut decoder = GzipMemberDecoder::new();

        assert_eq!(
            decode_in_pieces(&mut decoder, &first, 64, 64).unwrap(),
            b"first member"
        );
        decoder.reset();
        assert!(decoder.header().is_none());
        assert_eq!(
            decode_in_pieces(&mut decoder, &second, 64, 64).unwrap(),
            b"second member"
        );
        assert_eq!(decoder.header().unwrap().name(), "two");
    }

    #[test]
    fn test_corrupt_crc() {
        let mut member = gzip(b"checksummed data", None);
        let crc_pos = member.len() - TRAILER_LEN;
        member[crc_pos] ^= 0x55;

        let mut decoder = GzipMemberDecoder::new();
        let err = decode_in_pieces(&mut decoder, &member, 1024, 1024).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::Checksum));
        assert!(err.to_string().contains("incorrect data check"));
    }

    #[test]
    fn test_corrupt_length() {
        let mut member = gzip(b"sized data", None);
        let size_pos = member.len() - 4;
        member[size_pos] ^= 0x01;

        let mut decoder = GzipMemberDecoder::new();
        let err = decode_in_pieces(&mut decoder, &member, 1024, 1024).unwrap_err();
        assert!(err.to_string().contains("incorrect length check"));
    }

    #[test]
    fn test_invalid_deflate_block() {
        // Valid header, then a block with the reserved BTYPE=11.
        let mut member = vec![0x1F, 0x8B, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0x03];
        member.extend_from_slice(&[0x07, 0x00, 0x00, 0x00]);

        let mut decoder = GzipMemberDecoder::new();
        let mut out = [0u8; 64];
        let err = decoder
            .decode(&member, &mut out, DecodeMode::Full)
            .unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::Data));
    }
}
