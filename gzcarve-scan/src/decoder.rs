//! Drives the member decoder from the window.
//!
//! One [`GzipMemberDecoder`] is allocated on first use and reset for every
//! following member. Whenever it runs out of input, the window is refilled
//! keeping everything the decoder has not consumed yet.

use crate::gzip::{GzipHeader, GzipMemberDecoder};
use crate::window::Window;
use gzcarve_core::error::{CarveError, DecodeErrorKind, Result};
use gzcarve_core::traits::{DecodeMode, DecodeStatus, StreamDecoder};
use std::io::{Read, Write};
use tracing::debug;

/// Default size of the decompressed output chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Member header and payload decoding on top of a [`Window`].
pub struct MemberDecoder {
    engine: Option<GzipMemberDecoder>,
    name_limit: usize,
    chunk: Vec<u8>,
}

impl MemberDecoder {
    /// Create an adapter. The engine itself is created on first use.
    pub fn new(name_limit: usize, chunk_size: usize) -> Self {
        Self {
            engine: None,
            name_limit,
            chunk: vec![0u8; chunk_size.max(1)],
        }
    }

    /// Check if the engine has been allocated.
    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Parse the header of the member starting at the window's consumed start.
    ///
    /// On success the window's consumed start sits on the first payload byte.
    pub fn init_member<R: Read>(&mut self, window: &mut Window<R>) -> Result<GzipHeader> {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset();
        }
        let engine = self.engine.get_or_insert_with(GzipMemberDecoder::new);
        engine.request_header(self.name_limit);

        loop {
            let (consumed, _, status) =
                engine.decode(window.available(), &mut [], DecodeMode::HeaderOnly)?;
            window.consume(consumed);

            match status {
                DecodeStatus::NeedsInput => {
                    if window.refill(Some(window.start()))? == 0 {
                        return Err(CarveError::truncated(window.stream_offset()));
                    }
                }
                DecodeStatus::HeaderEnd | DecodeStatus::NeedsOutput | DecodeStatus::MemberEnd => {
                    break;
                }
            }
        }

        let header = engine
            .header()
            .cloned()
            .ok_or_else(|| CarveError::decode(DecodeErrorKind::Header, "header incomplete"))?;
        debug!(name = header.name(), flags = header.flags, "member header parsed");
        Ok(header)
    }

    /// Decode the payload of the member whose header was just parsed,
    /// writing it to `sink` chunk by chunk.
    ///
    /// `progress` is called with the size of every written chunk. Returns the
    /// total number of bytes written.
    pub fn decode_payload<R, W, F>(
        &mut self,
        window: &mut Window<R>,
        sink: &mut W,
        mut progress: F,
    ) -> Result<u64>
    where
        R: Read,
        W: Write,
        F: FnMut(u64),
    {
        let Some(engine) = self.engine.as_mut() else {
            return Err(CarveError::invalid_config(
                "payload requested before a member header was parsed",
            ));
        };
        let mut total = 0u64;

        loop {
            let (consumed, produced, status) =
                engine.decode(window.available(), &mut self.chunk, DecodeMode::Full)?;
            window.consume(consumed);

            if produced > 0 {
                sink.write_all(&self.chunk[..produced])
                    .map_err(CarveError::write)?;
                total += produced as u64;
                progress(produced as u64);
            }

            match status {
                DecodeStatus::MemberEnd => break,
                DecodeStatus::NeedsOutput | DecodeStatus::HeaderEnd => continue,
                DecodeStatus::NeedsInput => {
                    if window.refill(Some(window.start()))? == 0 {
                        return Err(CarveError::truncated(window.stream_offset()));
                    }
                }
            }
        }

        debug!(bytes = total, "member payload decoded");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::MIN_WINDOW_SIZE;
    use flate2::{Compression, GzBuilder};
    use std::io::Cursor;

    fn gzip(data: &[u8], name: &str) -> Vec<u8> {
        let mut encoder = GzBuilder::new()
            .filename(name)
            .write(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn primed(data: Vec<u8>, capacity: usize) -> Window<Cursor<Vec<u8>>> {
        let mut window = Window::with_capacity(Cursor::new(data), capacity).unwrap();
        window.refill(None).unwrap();
        window
    }

    #[test]
    fn test_header_then_payload() {
        let payload = b"The quick brown fox jumps over the lazy dog. ".repeat(200);
        let mut window = primed(gzip(&payload, "fox.txt"), MIN_WINDOW_SIZE);
        let mut decoder = MemberDecoder::new(29, 16);
        assert!(!decoder.is_initialized());

        let header = decoder.init_member(&mut window).unwrap();
        assert_eq!(header.name(), "fox.txt");
        assert!(decoder.is_initialized());

        let mut out = Vec::new();
        let mut chunks = 0;
        let written = decoder
            .decode_payload(&mut window, &mut out, |_| chunks += 1)
            .unwrap();
        assert_eq!(written, payload.len() as u64);
        assert_eq!(out, payload);
        assert!(chunks > 1);
    }

    #[test]
    fn test_truncated_header() {
        let member = gzip(b"abc", "a-name-that-never-ends");
        let mut window = primed(member[..20].to_vec(), MIN_WINDOW_SIZE);
        let mut decoder = MemberDecoder::new(29, 64);

        let err = decoder.init_member(&mut window).unwrap_err();
        assert!(matches!(err, CarveError::TruncatedStream { offset: 20 }));
    }

    #[test]
    fn test_truncated_payload() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 97) as u8).collect();
        let member = gzip(&payload, "cut");
        let cut = member.len() / 2;
        let mut window = primed(member[..cut].to_vec(), 64);
        let mut decoder = MemberDecoder::new(29, 256);

        decoder.init_member(&mut window).unwrap();
        let err = decoder
            .decode_payload(&mut window, &mut Vec::new(), |_| {})
            .unwrap_err();
        assert!(matches!(err, CarveError::TruncatedStream { .. }));
    }

    #[test]
    fn test_payload_before_header() {
        let mut window = primed(Vec::new(), MIN_WINDOW_SIZE);
        let mut decoder = MemberDecoder::new(29, 64);
        let err = decoder
            .decode_payload(&mut window, &mut Vec::new(), |_| {})
            .unwrap_err();
        assert!(matches!(err, CarveError::InvalidConfig { .. }));
    }

    #[test]
    fn test_write_failure() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut window = primed(gzip(b"some payload", "x"), MIN_WINDOW_SIZE);
        let mut decoder = MemberDecoder::new(29, 64);
        decoder.init_member(&mut window).unwrap();
        let err = decoder
            .decode_payload(&mut window, &mut Full, |_| {})
            .unwrap_err();
        assert!(matches!(err, CarveError::Write(_)));
    }
}
