//! # gzcarve Scan
//!
//! Finds gzip members embedded in arbitrary byte streams and extracts them.
//!
//! The input is read once, front to back, through a fixed-size [`Window`].
//! Every `0x1f` byte is a candidate; the [`heuristic`] checks decide whether
//! the ten bytes at a candidate look like a real member header. Accepted
//! members can be listed or decoded with the streaming member engine in
//! [`gzip`].
//!
//! - [`window`]: buffered input with keep-from refills
//! - [`heuristic`]: strict and lenient header plausibility checks
//! - [`scanner`]: candidate search
//! - [`gzip`]: header parser and member decoder
//! - [`decoder`]: drives the member decoder from the window
//! - [`output`]: output file naming and creation
//! - [`session`]: listing and extraction
//!
//! ## Example
//!
//! ```rust
//! use gzcarve_scan::Session;
//! use std::io::{Cursor, Write};
//!
//! let mut encoder = flate2::GzBuilder::new()
//!     .filename("notes.txt")
//!     .write(Vec::new(), flate2::Compression::default());
//! encoder.write_all(b"hidden in plain sight").unwrap();
//!
//! let mut image = vec![0u8; 300];
//! image.extend_from_slice(&encoder.finish().unwrap());
//! image.extend_from_slice(&[0u8; 300]);
//!
//! let members = Session::new(Cursor::new(image.clone())).list().unwrap();
//! assert_eq!(members[0].offset, 300);
//! assert_eq!(members[0].name(), "notes.txt");
//!
//! let mut out = Vec::new();
//! Session::new(Cursor::new(image)).extract_to_writer(1, &mut out).unwrap();
//! assert_eq!(out, b"hidden in plain sight");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decoder;
pub mod gzip;
pub mod heuristic;
pub mod output;
pub mod scanner;
pub mod session;
pub mod window;

// Re-exports
pub use decoder::MemberDecoder;
pub use gzip::{GzipHeader, GzipMemberDecoder};
pub use heuristic::{HeuristicConfig, Rejection};
pub use output::OutputPolicy;
pub use scanner::{ScanOutcome, ScanState, Scanner};
pub use session::{ExtractReport, MemberInfo, Session, SessionOptions};
pub use window::Window;
