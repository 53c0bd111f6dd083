//! Frame iteration over a concatenated buffer.

use bytes::Buf;

use super::{FrameLayout, HEADER_LEN, SymbolFrame};
use crate::error::FecError;

/// An iterator over the frames of a concatenated buffer.
///
/// Yields borrowed frames; nothing is copied. A trailing partial frame yields
/// [`FecError::TruncatedFrame`] and ends iteration. With digests enabled, a
/// frame whose trailer does not match yields [`FecError::CorruptFrame`] and
/// iteration continues with the next frame.
///
/// # Example
///
/// ```
/// use fecframe::{FrameLayout, FrameReader};
///
/// let wire = [0, 0, 0, 0, 1, 0, 0, 0, 0xAA, 0xBB];
/// let frames: Vec<_> = FrameReader::new(&wire, FrameLayout::plain(2))
///     .collect::<Result<_, _>>()?;
///
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].symbol_id, 1);
/// assert_eq!(frames[0].payload, &[0xAA, 0xBB]);
/// # Ok::<(), fecframe::FecError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    buf: &'a [u8],
    layout: FrameLayout,
    offset: usize,
    finished: bool,
}

impl<'a> FrameReader<'a> {
    /// Creates a reader over `buf` using `layout`.
    pub fn new(buf: &'a [u8], layout: FrameLayout) -> Self {
        Self {
            buf,
            layout,
            offset: 0,
            finished: false,
        }
    }

    /// Returns the byte offset of the next frame.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the number of whole frames left.
    pub fn remaining_frames(&self) -> usize {
        (self.buf.len() - self.offset) / self.layout.frame_len()
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = Result<SymbolFrame<&'a [u8]>, FecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.offset == self.buf.len() {
            return None;
        }

        let frame_len = self.layout.frame_len();
        let rest = &self.buf[self.offset..];
        if rest.len() < frame_len {
            self.finished = true;
            return Some(Err(FecError::TruncatedFrame {
                offset: self.offset,
                available: rest.len(),
                frame_len,
            }));
        }

        let raw = &rest[..frame_len];
        self.offset += frame_len;

        let mut header = &raw[..HEADER_LEN];
        let block_index = header.get_u32_le();
        let symbol_id = header.get_u32_le();
        let payload_end = HEADER_LEN + self.layout.symbol_size();
        let payload = &raw[HEADER_LEN..payload_end];

        #[cfg(feature = "hash-blake3")]
        if self.layout.has_digest() {
            let mut header = [0u8; HEADER_LEN];
            header.copy_from_slice(&raw[..HEADER_LEN]);
            let expected = crate::hash::FrameDigest::compute(&header, payload);
            if raw[payload_end..] != expected {
                return Some(Err(FecError::CorruptFrame {
                    block_index,
                    symbol_id,
                }));
            }
        }

        Some(Ok(SymbolFrame {
            block_index,
            symbol_id,
            payload,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let whole = self.remaining_frames();
        let partial = usize::from((self.buf.len() - self.offset) % self.layout.frame_len() != 0);
        (whole, Some(whole + partial))
    }
}
