//! Symbol frame wire format.
//!
//! - [`SymbolFrame`] - One framed source or repair symbol
//! - [`FrameLayout`] - Size and trailer rules shared by writer and reader
//! - [`FrameReader`] - Iterates frames out of a concatenated buffer
//!
//! ```text
//! offset 0: block_index  (u32, little-endian)
//! offset 4: symbol_id    (u32, little-endian)
//! offset 8: payload      (symbol_size bytes)
//! [offset 8 + symbol_size: digest (8 bytes), only with frame digests enabled]
//! ```
//!
//! Frames are not self-describing: the reader must be given the same
//! `symbol_size` (and digest setting) the writer used.

mod reader;
mod symbol;

pub use reader::FrameReader;
pub use symbol::SymbolFrame;

/// Size of the fixed frame header.
pub const HEADER_LEN: usize = 8;

/// Size of the optional digest trailer.
pub const DIGEST_LEN: usize = 8;

/// Wire layout of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameLayout {
    symbol_size: usize,
    digest: bool,
}

impl FrameLayout {
    /// Layout without integrity trailer: `8 + symbol_size` bytes.
    pub const fn plain(symbol_size: usize) -> Self {
        Self {
            symbol_size,
            digest: false,
        }
    }

    /// Layout with a BLAKE3 digest trailer (requires `hash-blake3` feature).
    #[cfg(feature = "hash-blake3")]
    pub const fn with_digest(symbol_size: usize) -> Self {
        Self {
            symbol_size,
            digest: true,
        }
    }

    /// Returns the payload size.
    pub const fn symbol_size(&self) -> usize {
        self.symbol_size
    }

    /// Returns whether frames carry a digest trailer.
    pub const fn has_digest(&self) -> bool {
        self.digest
    }

    /// Returns the total frame size on the wire.
    pub const fn frame_len(&self) -> usize {
        HEADER_LEN + self.symbol_size + if self.digest { DIGEST_LEN } else { 0 }
    }
}
