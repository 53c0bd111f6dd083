//! Per-block encode state shared by every encode driver.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::SymbolEncoder;
use crate::config::FecConfig;
use crate::error::FecError;
use crate::frame::SymbolFrame;

/// Accumulates up to K source symbols and turns them into repair frames.
///
/// The block buffer always spans `K * symbol_size` bytes; slots that never
/// receive data stay zero, which is the padding the engine sees for a short
/// final block.
#[derive(Debug)]
pub(crate) struct BlockEncoder<E> {
    engine: E,
    symbol_size: usize,
    block_symbols: u16,
    repair_symbols: u32,
    block: Vec<u8>,
    filled: u16,
    block_index: u32,
    exhausted: bool,
}

impl<E: SymbolEncoder> BlockEncoder<E> {
    pub(crate) fn new(engine: E, config: &FecConfig) -> Self {
        Self {
            engine,
            symbol_size: config.symbol_size(),
            block_symbols: config.block_symbols(),
            repair_symbols: config.repair_symbols(),
            block: vec![0u8; config.block_len()],
            filled: 0,
            block_index: 0,
            exhausted: false,
        }
    }

    pub(crate) fn block_index(&self) -> u32 {
        self.block_index
    }

    pub(crate) fn repair_symbols(&self) -> u32 {
        self.repair_symbols
    }

    /// Returns true once K source symbols are in the block.
    pub(crate) fn is_full(&self) -> bool {
        self.filled == self.block_symbols
    }

    /// Returns true if the block holds source symbols without repair yet.
    pub(crate) fn has_pending(&self) -> bool {
        self.filled > 0
    }

    /// Copies `chunk` into the next source slot and returns its frame.
    ///
    /// `chunk` may be shorter than `symbol_size`; the frame payload is the
    /// zero-padded slot.
    pub(crate) fn push_source(&mut self, chunk: &[u8]) -> Result<SymbolFrame, FecError> {
        if self.exhausted {
            return Err(FecError::TooManyBlocks);
        }
        debug_assert!(chunk.len() <= self.symbol_size);
        debug_assert!(!self.is_full());

        let start = usize::from(self.filled) * self.symbol_size;
        let slot = &mut self.block[start..start + self.symbol_size];
        slot[..chunk.len()].copy_from_slice(chunk);

        let frame = SymbolFrame::new(
            self.block_index,
            u32::from(self.filled),
            Bytes::copy_from_slice(slot),
        );
        self.filled += 1;

        trace!(
            block_index = frame.block_index,
            symbol_id = frame.symbol_id,
            len = chunk.len(),
            "source symbol"
        );
        Ok(frame)
    }

    /// Hands the block to the engine and waits for precomputation.
    pub(crate) fn prepare_repair(&mut self) -> Result<(), FecError> {
        let block_index = self.block_index;
        debug!(
            block_index,
            source_symbols = self.filled,
            "precomputing repair symbols"
        );
        self.engine
            .load(&self.block)
            .and_then(|()| self.engine.precompute())
            .map_err(|e| FecError::engine(block_index, e))
    }

    /// Produces repair frame `index` (symbol id `K + index`).
    pub(crate) fn repair_frame(&mut self, index: u32) -> Result<SymbolFrame, FecError> {
        let block_index = self.block_index;
        let payload = self
            .engine
            .repair_symbol(index)
            .map_err(|e| FecError::engine(block_index, e))?;

        if payload.len() != self.symbol_size {
            return Err(FecError::engine(
                block_index,
                crate::error::EngineError::SymbolLength {
                    expected: self.symbol_size,
                    actual: payload.len(),
                },
            ));
        }

        // K + R fits a u32, checked by FecConfig::validate
        let symbol_id = u32::from(self.block_symbols) + index;
        Ok(SymbolFrame::new(block_index, symbol_id, payload))
    }

    /// Resets the engine and the block buffer and moves to the next index.
    pub(crate) fn finish_block(&mut self) {
        debug!(block_index = self.block_index, "block encoded");
        self.engine.clear();
        self.block.fill(0);
        self.filled = 0;
        match self.block_index.checked_add(1) {
            Some(next) => self.block_index = next,
            None => self.exhausted = true,
        }
    }
}
