//! Error types for fecframe.
//!
//! [`FecError`] is what every driver returns. [`EngineError`] is what an
//! erasure-coding engine reports; the drivers wrap it together with the block
//! it happened in.

use thiserror::Error;

/// Errors that can occur while encoding or decoding a framed stream.
#[derive(Debug, Error)]
pub enum FecError {
    /// An I/O error occurred while reading input data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// The caller-supplied output buffer cannot hold the next write.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    OutputTooSmall {
        /// Bytes required by the pending write.
        needed: usize,
        /// Bytes left in the output buffer.
        available: usize,
    },

    /// The requested block size is not in the engine's catalog.
    #[error("unsupported block size: {block_symbols} symbols per block")]
    UnsupportedBlockSize {
        /// The rejected number of source symbols per block.
        block_symbols: u16,
    },

    /// The input ended in the middle of a frame.
    #[error("truncated frame at offset {offset}: {available} of {frame_len} bytes")]
    TruncatedFrame {
        /// Byte offset of the partial frame within the input.
        offset: usize,
        /// Bytes present.
        available: usize,
        /// Bytes a full frame needs.
        frame_len: usize,
    },

    /// A frame failed its digest check.
    ///
    /// Only produced when frame digests are enabled. Decoders treat this as an
    /// erasure and keep going.
    #[error("corrupt frame: block {block_index}, symbol {symbol_id}")]
    CorruptFrame {
        /// Block index read from the (untrusted) header.
        block_index: u32,
        /// Symbol id read from the (untrusted) header.
        symbol_id: u32,
    },

    /// A block needed for reassembly never received any frame.
    #[error("block {block_index} missing during reassembly")]
    MissingBlock {
        /// The first block index with no decoder.
        block_index: u32,
    },

    /// A frame references a block past the end of the byte budget.
    #[error("unexpected block {block_index}: stream only has {block_count} blocks")]
    UnexpectedBlock {
        /// The offending block index.
        block_index: u32,
        /// Number of blocks the byte budget allows.
        block_count: u32,
    },

    /// The input needs more blocks than a `u32` block index can address.
    #[error("too many blocks for a 32-bit block index")]
    TooManyBlocks,

    /// The erasure-coding engine failed.
    #[error("engine error in block {block_index}: {source}")]
    Engine {
        /// Block being processed when the engine failed.
        block_index: u32,
        /// What the engine reported.
        #[source]
        source: EngineError,
    },
}

impl FecError {
    /// Wraps an engine error with the block it belongs to.
    pub(crate) fn engine(block_index: u32, source: EngineError) -> Self {
        FecError::Engine {
            block_index,
            source,
        }
    }
}

/// Failures reported by an erasure-coding engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine cannot be built for these parameters.
    #[error("unsupported parameters: {block_symbols} symbols of {symbol_size} bytes")]
    Unsupported {
        /// Requested source symbols per block.
        block_symbols: u16,
        /// Requested symbol size.
        symbol_size: usize,
    },

    /// The block payload handed to the encoder has the wrong length.
    #[error("block payload length mismatch: expected {expected}, got {actual}")]
    PayloadLength {
        /// Required length (`K * symbol_size`).
        expected: usize,
        /// Length supplied.
        actual: usize,
    },

    /// Precomputation was requested before a block was loaded.
    #[error("no block loaded")]
    NotLoaded,

    /// Precomputation did not complete successfully.
    #[error("precomputation failed: {reason}")]
    PrecomputeFailed {
        /// Engine-specific reason.
        reason: &'static str,
    },

    /// A symbol has the wrong length.
    #[error("symbol length mismatch: expected {expected}, got {actual}")]
    SymbolLength {
        /// Configured symbol size.
        expected: usize,
        /// Length supplied or produced.
        actual: usize,
    },

    /// A symbol id cannot be mapped onto the engine's symbol space.
    #[error("symbol id {symbol_id} out of range")]
    SymbolId {
        /// The rejected id.
        symbol_id: u32,
    },

    /// Not enough distinct symbols arrived to reconstruct the block.
    #[error("insufficient symbols: received {received}, block has {needed} source symbols")]
    Insufficient {
        /// Distinct symbols received.
        received: u32,
        /// Source symbols in the block.
        needed: u32,
    },

    /// Source data was requested from a decoder that has not finished.
    #[error("block not decoded")]
    NotDecoded,
}
