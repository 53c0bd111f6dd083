//! The SymbolFrame type - one framed symbol.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::{FrameLayout, HEADER_LEN};

/// A framed source or repair symbol.
///
/// `symbol_id < K` marks a source symbol, `symbol_id >= K` a repair symbol.
/// The payload type is generic so frames parsed out of a borrowed buffer do
/// not need to copy: [`FrameReader`](super::FrameReader) yields
/// `SymbolFrame<&[u8]>`, the encoders yield `SymbolFrame<Bytes>`.
///
/// # Example
///
/// ```
/// use fecframe::{FrameLayout, SymbolFrame};
///
/// let frame = SymbolFrame::new(1, 2, &[0xAA; 4][..]);
/// let wire = frame.to_bytes(FrameLayout::plain(4));
///
/// assert_eq!(&wire[..8], &[1, 0, 0, 0, 2, 0, 0, 0]);
/// assert_eq!(&wire[8..], &[0xAA; 4]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolFrame<P = Bytes> {
    /// Index of the block this symbol belongs to.
    pub block_index: u32,

    /// Symbol id within the block.
    pub symbol_id: u32,

    /// Symbol payload, exactly `symbol_size` bytes.
    pub payload: P,
}

impl<P: AsRef<[u8]>> SymbolFrame<P> {
    /// Creates a new frame.
    pub fn new(block_index: u32, symbol_id: u32, payload: P) -> Self {
        Self {
            block_index,
            symbol_id,
            payload,
        }
    }

    /// Returns true if this frame carries a source symbol for blocks of `block_symbols`.
    pub fn is_source(&self, block_symbols: u16) -> bool {
        self.symbol_id < u32::from(block_symbols)
    }

    /// Returns the payload bytes.
    pub fn payload(&self) -> &[u8] {
        self.payload.as_ref()
    }

    /// Returns the encoded 8-byte header.
    pub fn header(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[..4].copy_from_slice(&self.block_index.to_le_bytes());
        header[4..].copy_from_slice(&self.symbol_id.to_le_bytes());
        header
    }

    /// Writes the frame into `dst`.
    ///
    /// The caller must ensure `dst` has at least `layout.frame_len()` bytes of
    /// room; `BufMut` implementations over fixed slices panic otherwise.
    pub fn write_to<B: BufMut>(&self, layout: FrameLayout, dst: &mut B) {
        debug_assert_eq!(self.payload().len(), layout.symbol_size());

        let header = self.header();
        dst.put_slice(&header);
        dst.put_slice(self.payload());

        #[cfg(feature = "hash-blake3")]
        if layout.has_digest() {
            dst.put_slice(&crate::hash::FrameDigest::compute(&header, self.payload()));
        }
    }

    /// Encodes the frame into a new buffer.
    pub fn to_bytes(&self, layout: FrameLayout) -> Bytes {
        let mut buf = BytesMut::with_capacity(layout.frame_len());
        self.write_to(layout, &mut buf);
        buf.freeze()
    }

    /// Copies a borrowed frame into an owned one.
    pub fn to_owned_frame(&self) -> SymbolFrame<Bytes> {
        SymbolFrame {
            block_index: self.block_index,
            symbol_id: self.symbol_id,
            payload: Bytes::copy_from_slice(self.payload()),
        }
    }
}

impl<P: AsRef<[u8]>> fmt::Display for SymbolFrame<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame(block {}, symbol {}, {} bytes)",
            self.block_index,
            self.symbol_id,
            self.payload().len()
        )
    }
}
