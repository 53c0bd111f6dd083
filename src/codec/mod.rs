//! Erasure-coding engine contract.
//!
//! The framing layer drives an engine it knows nothing about beyond these
//! traits:
//!
//! - [`ErasureCodec`] - Factory for per-block encoders and decoders, owner of the catalog
//! - [`SymbolEncoder`] - Loads one block of source data and produces repair symbols
//! - [`SymbolDecoder`] - Collects symbols for one block and reconstructs its source symbols
//! - [`RaptorQCodec`] - RFC 6330 engine backed by the `raptorq` crate
//!
//! Engines always work on full blocks of exactly `K * symbol_size` bytes.
//! Short final blocks are zero-padded by the encode driver and completed with
//! zero placeholder symbols by the decode driver.

mod rfc6330;

#[cfg(test)]
pub(crate) mod parity;

pub use rfc6330::{RaptorQCodec, RaptorQDecoder, RaptorQEncoder, list_block_sizes};

use bytes::Bytes;

use crate::catalog::BlockSizeCatalog;
use crate::error::EngineError;

/// A factory for block encoders and decoders of one coding scheme.
pub trait ErasureCodec {
    /// Per-block encoder type.
    type Encoder: SymbolEncoder;

    /// Per-block decoder type.
    type Decoder: SymbolDecoder;

    /// Returns the block sizes (K values) this engine supports.
    fn catalog(&self) -> &BlockSizeCatalog;

    /// Creates an encoder for blocks of `block_symbols` symbols of `symbol_size` bytes.
    ///
    /// The encoder is reused for every block of a stream through
    /// [`SymbolEncoder::clear`].
    fn new_encoder(
        &self,
        block_symbols: u16,
        symbol_size: usize,
    ) -> Result<Self::Encoder, EngineError>;

    /// Creates a decoder for a single block.
    fn new_decoder(
        &self,
        block_symbols: u16,
        symbol_size: usize,
    ) -> Result<Self::Decoder, EngineError>;
}

/// Produces repair symbols for one block at a time.
///
/// Call sequence per block: [`load`](Self::load), [`precompute`](Self::precompute),
/// any number of [`repair_symbol`](Self::repair_symbol), then [`clear`](Self::clear).
pub trait SymbolEncoder {
    /// Loads the block's source data, exactly `K * symbol_size` bytes.
    fn load(&mut self, block: &[u8]) -> Result<(), EngineError>;

    /// Runs the engine's precomputation for the loaded block and waits for it.
    fn precompute(&mut self) -> Result<(), EngineError>;

    /// Returns repair symbol `index` (wire symbol id `K + index`).
    fn repair_symbol(&mut self, index: u32) -> Result<Bytes, EngineError>;

    /// Drops all per-block state. The next block starts from scratch.
    fn clear(&mut self);
}

/// Response of a decoder to an offered symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The symbol was stored.
    Accepted,

    /// The decoder already had this symbol or no longer needs any.
    NotNeeded,
}

/// Collects symbols for one block and reconstructs its source symbols.
pub trait SymbolDecoder {
    /// Offers a symbol to the decoder.
    fn add_symbol(&mut self, symbol_id: u32, payload: &[u8]) -> Result<AddOutcome, EngineError>;

    /// Returns how many more distinct symbols the decoder wants. Zero means ready.
    fn needed(&self) -> u32;

    /// Blocks until reconstruction has finished.
    fn wait(&mut self) -> Result<(), EngineError>;

    /// Copies reconstructed source symbol `index` into `out` (`symbol_size` bytes).
    fn source_symbol(&self, index: u16, out: &mut [u8]) -> Result<(), EngineError>;
}
