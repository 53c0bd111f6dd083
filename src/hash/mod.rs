//! Per-frame integrity digests.
//!
//! - [`FrameDigest`] - Truncated BLAKE3 over header and payload (requires `hash-blake3` feature)
//!
//! The digest only guards against accidental corruption in transit. A frame
//! that fails verification is reported as an erasure, never as data.

#[cfg(feature = "hash-blake3")]
mod blake3;

#[cfg(feature = "hash-blake3")]
pub(crate) use blake3::FrameDigest;
