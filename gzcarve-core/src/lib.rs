//! # gzcarve Core
//!
//! Core components shared by the gzcarve crates.
//!
//! - [`error`]: the error type every carving operation reports
//! - [`traits`]: the streaming decoder contract the scanner drives
//!
//! ## Architecture
//!
//! gzcarve is layered the same way from the bottom up:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Front end                                           │
//! │     gzcarve CLI: listing, extraction, progress          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Carving                                             │
//! │     Window, heuristics, scanner, member engine, session │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Contract (this crate)                               │
//! │     CarveError, StreamDecoder, DecodeStatus             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gzcarve_core::error::CarveError;
//!
//! let err = CarveError::ordinal_out_of_range(5, 2);
//! assert!(err.to_string().contains("5"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod traits;

// Re-exports for convenience
pub use error::{CarveError, DecodeErrorKind, Result};
pub use traits::{DecodeMode, DecodeStatus, StreamDecoder};
