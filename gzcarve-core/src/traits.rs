//! Streaming decoder contract.
//!
//! The carving session never materializes a whole member. It hands the
//! decoder whatever prefix of the window is available and reacts to the
//! returned [`DecodeStatus`]. Running out of input is an expected, frequent
//! outcome and is reported as a status, not an error.

use crate::error::Result;

/// How far a decode step is allowed to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Parse the member header, then stop without touching the payload.
    HeaderOnly,
    /// Decode through the end of the member.
    #[default]
    Full,
}

/// Status of a streaming decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// All supplied input was used; more is needed to continue.
    NeedsInput,
    /// The output buffer was filled; call again to drain pending output.
    NeedsOutput,
    /// The member header is complete (only in [`DecodeMode::HeaderOnly`]).
    HeaderEnd,
    /// The member trailer was read and verified.
    MemberEnd,
}

/// A resettable streaming decoder bound to one member at a time.
pub trait StreamDecoder {
    /// Header metadata captured while decoding.
    type Header;

    /// Return to the initial state, reusing internal allocations.
    fn reset(&mut self);

    /// Capture header metadata for the next member, keeping at most
    /// `name_limit` bytes of the embedded name.
    fn request_header(&mut self, name_limit: usize);

    /// Decode from `input` into `output`.
    ///
    /// # Returns
    ///
    /// A tuple of (bytes consumed from input, bytes written to output, status)
    fn decode(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        mode: DecodeMode,
    ) -> Result<(usize, usize, DecodeStatus)>;

    /// The captured header, once it has been fully parsed.
    fn header(&self) -> Option<&Self::Header>;

    /// Check if the current member has been fully decoded.
    fn is_finished(&self) -> bool;
}
