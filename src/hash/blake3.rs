//! BLAKE3-based frame digest.

use crate::frame::{DIGEST_LEN, HEADER_LEN};

/// Computes the digest trailer of a frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameDigest;

impl FrameDigest {
    /// Returns the first [`DIGEST_LEN`] bytes of `BLAKE3(header || payload)`.
    pub(crate) fn compute(header: &[u8; HEADER_LEN], payload: &[u8]) -> [u8; DIGEST_LEN] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(header);
        hasher.update(payload);

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&hasher.finalize().as_bytes()[..DIGEST_LEN]);
        digest
    }
}
