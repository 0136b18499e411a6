//! GZIP member framing (RFC 1952).
//!
//! A member is a header, a raw DEFLATE stream and an 8-byte trailer holding
//! the CRC-32 and the length modulo 2^32 of the decoded data.
//!
//! ## Example
//!
//! ```rust
//! use gzcarve_core::{DecodeMode, DecodeStatus, StreamDecoder};
//! use gzcarve_scan::gzip::GzipMemberDecoder;
//! use std::io::Write;
//!
//! let mut encoder = flate2::GzBuilder::new()
//!     .filename("hello.txt")
//!     .write(Vec::new(), flate2::Compression::default());
//! encoder.write_all(b"Hello, World!").unwrap();
//! let member = encoder.finish().unwrap();
//!
//! let mut decoder = GzipMemberDecoder::new();
//! let mut out = [0u8; 64];
//! let (_, n, status) = decoder.decode(&member, &mut out, DecodeMode::Full).unwrap();
//! assert_eq!(status, DecodeStatus::MemberEnd);
//! assert_eq!(&out[..n], b"Hello, World!");
//! assert_eq!(decoder.header().unwrap().name(), "hello.txt");
//! ```

pub mod header;
mod member;

pub use header::{GzipHeader, HeaderParser};
pub use member::{GzipMemberDecoder, TRAILER_LEN};
